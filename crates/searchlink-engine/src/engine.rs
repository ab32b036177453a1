//! Rewrite engine.
//!
//! A run works in three steps. A sequential planning pass walks the lines,
//! tracks code blocks and inline flags, and turns every directive span into
//! an action carrying a snapshot of the configuration in effect for it.
//! Searches are then resolved, sequentially or in parallel. Finally the
//! results are assembled in document order: markers are assigned, the footer
//! and logs are filled, and the edits are applied from the unchanged source
//! into a fresh buffer.

use std::collections::{BTreeMap, HashSet};
use std::ops::Range;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use rayon::prelude::*;
use regex::Regex;
use searchlink_config::Config;

use crate::directive::{self, Modifiers, Parsed};
use crate::dispatch::{DispatchRequest, Dispatcher, is_domain_trigger};
use crate::edits::LineEdits;
use crate::fence::FenceTracker;
use crate::links::{Footer, LinkForm, LinkTable, Markers, is_definition_line, render_link};
use crate::provider::{LinkValidator, TitleFetcher};
use crate::registry::{Registry, Resolution};
use crate::report::{ErrorLog, LogEntry, Position, ReportLog, strip_previous_blocks};
use crate::result::{ErrorKind, ResultKind, SearchResult};
use crate::scope::ScopeStack;

static QUERY_CLIPBOARD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\^[!~:]*$").unwrap());

static QUERY_URL_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!![\^~:]*$").unwrap());

static QUERY_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[!\^\s~]*$").unwrap());

static QUERY_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[:!\^\s~]*$").unwrap());

static ONLY_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://)?[\w-]+(\.[\w-]+)+(:\d+)?(/\S*)?$").unwrap()
});

static ADDITIONAL_TERMS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((.*?)\)").unwrap());

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""(.*?)""#).unwrap());

static QUERY_TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^!(\S+)\s+(.*)$").unwrap());

static QUERY_SOCIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([tfilm])?@(\S+)\s*$").unwrap());

/// Result of a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub output: String,
    /// A `^` modifier asked for the result to go to the clipboard.
    pub clipboard: bool,
    /// Directive spans processed.
    pub links: usize,
    /// Every error as `(Label) (pos): message`, including ones not written
    /// into the output.
    pub errors: Vec<String>,
}

impl Rewrite {
    fn unchanged(input: &str) -> Self {
        Self {
            output: input.to_owned(),
            clipboard: false,
            links: 0,
            errors: Vec::new(),
        }
    }
}

/// What to do with one directive span.
enum Action {
    /// Inside inline code; reported and left alone.
    InlineCode,
    /// Ordinary Markdown link.
    Link,
    Fail { kind: ErrorKind, detail: String },
    Footnote { link_text: String, note: String },
    Search { request: DispatchRequest, modifiers: Modifiers },
}

struct Planned {
    line: usize,
    range: Range<usize>,
    text: String,
    position: Position,
    config: Config,
    action: Action,
}

/// Rewrites directives in documents.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    dispatcher: Dispatcher,
    parallel: bool,
}

impl Engine {
    /// Create an engine. Custom searches from `config` are added to `registry`.
    #[must_use]
    pub fn new(config: Config, mut registry: Registry) -> Self {
        registry.set_custom_searches(&config.custom_site_searches);
        Self {
            config,
            dispatcher: Dispatcher::new(registry),
            parallel: false,
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn LinkValidator>) -> Self {
        self.dispatcher = self.dispatcher.with_validator(validator);
        self
    }

    #[must_use]
    pub fn with_title_fetcher(mut self, titles: Arc<dyn TitleFetcher>) -> Self {
        self.dispatcher = self.dispatcher.with_title_fetcher(titles);
        self
    }

    /// Pause for `delay` before every `every`-th search.
    #[must_use]
    pub fn with_throttle(mut self, every: usize, delay: Duration) -> Self {
        self.dispatcher = self.dispatcher.with_throttle(every, delay);
        self
    }

    /// Resolve searches on the rayon thread pool.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        self.dispatcher.registry()
    }

    /// Rewrite every directive in `input`.
    ///
    /// Input without any directive span is returned unchanged.
    #[must_use]
    pub fn rewrite(&self, input: &str) -> Rewrite {
        if !directive::has_spans(input) {
            return Rewrite::unchanged(input);
        }

        let single_line = input.lines().count() <= 1;
        let source = strip_previous_blocks(input);
        let lines: Vec<&str> = source.split('\n').collect();

        let mut scope = ScopeStack::new(self.config.clone());
        let plans = self.plan(&lines, &mut scope);
        let final_config = scope.into_config();

        let results = self.resolve_all(&plans);

        let mut run = Assembly::new(&source);
        let mut results = results.into_iter();
        for plan in &plans {
            let result = match plan.action {
                Action::Search { .. } => results.next(),
                _ => None,
            };
            run.assemble(plan, result);
        }

        run.finish(&lines, &final_config, single_line, plans.len())
    }

    /// Walk the document and decide what to do with each span.
    fn plan(&self, lines: &[&str], scope: &mut ScopeStack) -> Vec<Planned> {
        let registry = self.dispatcher.registry();
        let mut fences = FenceTracker::new();
        let mut plans = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            if fences.classify(line).is_code() {
                continue;
            }
            if scope.apply_assignment(line) {
                continue;
            }

            let spans = directive::find_spans(line);
            if spans.is_empty() {
                continue;
            }

            let token = scope.begin_line();
            for span in spans {
                let position = Position {
                    line: index + 1,
                    column: span.range.start,
                    length: span.text.len(),
                };
                let mut planned = Planned {
                    line: index,
                    range: span.range.clone(),
                    text: span.text.to_owned(),
                    position,
                    config: Config::default(),
                    action: Action::Link,
                };

                if directive::in_inline_code(&line[..span.range.start]) {
                    planned.action = Action::InlineCode;
                    planned.config = scope.config().clone();
                    plans.push(planned);
                    continue;
                }

                let info = scope.apply_flags(span.info);
                let whole_line = line.trim() == span.text;
                let parsed = directive::parse(span.link_text, &info, whole_line);

                if let Parsed::Search(directive) = &parsed
                    && let Some(trigger) = &directive.trigger
                    && let Some(Resolution::Custom(value)) = registry.resolve(trigger)
                {
                    let value = value.to_owned();
                    let _ = scope.apply_flags(&value);
                }

                planned.config = scope.config().clone();
                planned.action = match parsed {
                    Parsed::Link => Action::Link,
                    Parsed::Empty => Action::Fail {
                        kind: ErrorKind::EmptyInput,
                        detail: String::new(),
                    },
                    Parsed::MissingTrigger => Action::Fail {
                        kind: ErrorKind::InvalidTrigger {
                            suggestions: Vec::new(),
                        },
                        detail: String::new(),
                    },
                    Parsed::Footnote { link_text, note } => Action::Footnote { link_text, note },
                    Parsed::Search(directive) => match directive.trigger {
                        Some(trigger)
                            if !registry.is_valid_trigger(&trigger) && !is_domain_trigger(&trigger) =>
                        {
                            Action::Fail {
                                kind: ErrorKind::InvalidTrigger {
                                    suggestions: registry.suggestions(&trigger),
                                },
                                detail: String::new(),
                            }
                        }
                        trigger => Action::Search {
                            request: DispatchRequest {
                                trigger,
                                terms: directive.terms,
                                link_text: directive.link_text,
                                titleize: directive.modifiers.titleize
                                    || planned.config.empty_uses_page_title,
                                config: planned.config.clone(),
                            },
                            modifiers: directive.modifiers,
                        },
                    },
                };
                plans.push(planned);
            }
            scope.restore(token);
        }

        plans
    }

    fn resolve_all(&self, plans: &[Planned]) -> Vec<SearchResult> {
        let jobs: Vec<(usize, &DispatchRequest)> = plans
            .iter()
            .filter_map(|plan| match &plan.action {
                Action::Search { request, .. } => Some(request),
                _ => None,
            })
            .enumerate()
            .map(|(index, request)| (index + 1, request))
            .collect();

        if self.parallel {
            tracing::debug!(searches = jobs.len(), "Resolving in parallel");
            jobs.par_iter()
                .map(|(invocation, request)| self.dispatcher.resolve_directive(request, *invocation))
                .collect()
        } else {
            jobs.iter()
                .map(|(invocation, request)| self.dispatcher.resolve_directive(request, *invocation))
                .collect()
        }
    }

    /// Resolve a bare query line (no directive syntax) into a link.
    #[must_use]
    pub fn resolve_query(&self, query: &str) -> Rewrite {
        let mut scope = ScopeStack::new(self.config.clone());
        let token = scope.begin_line();
        let text = scope.apply_flags(query.trim());
        let config = scope.config().clone();
        scope.restore(token);

        let text = text.trim();
        let clipboard = QUERY_CLIPBOARD_RE.is_match(text);
        let url_only = QUERY_URL_ONLY_RE.is_match(text);
        let reference = QUERY_REFERENCE_RE.is_match(text);
        let text = QUERY_SUFFIX_RE.replace(text, "").trim().to_owned();
        let form = if reference {
            LinkForm::Definition
        } else {
            LinkForm::Inline
        };

        let mut errors = ErrorLog::new();
        let result = if text.is_empty() {
            SearchResult::failure(ErrorKind::EmptyInput, "", "")
        } else if ONLY_URL_RE.is_match(&text) {
            url_result(&text)
        } else {
            self.query_result(&text, &config)
        };

        let mut output = if let ResultKind::Failure(kind) = &result.kind {
            errors.push(kind.to_string(), LogEntry::new(None, detail(&result.title, query.trim())));
            query.trim().to_owned()
        } else {
            for note in &result.notes {
                errors.push(note.kind.to_string(), LogEntry::new(None, note.message.clone()));
            }
            match result.kind {
                ResultKind::Embed | ResultKind::SpellingCorrection => result.bare_text().to_owned(),
                _ if clipboard || url_only => result.url.clone(),
                _ => {
                    let title = (config.include_titles || result.force_title)
                        .then_some(result.title.as_str());
                    render_link(form, &result.link_text, &result.url, title)
                }
            }
        };

        for line in errors.lines() {
            tracing::warn!("{line}");
        }
        if config.debug && !clipboard {
            output.push_str(&errors.render(true));
        }

        Rewrite {
            output,
            clipboard,
            links: 1,
            errors: errors.lines(),
        }
    }

    fn query_result(&self, text: &str, config: &Config) -> SearchResult {
        let registry = self.dispatcher.registry();

        let mut additional = String::new();
        for caps in ADDITIONAL_TERMS_RE.captures_iter(text) {
            additional.push(' ');
            additional.push_str(caps[1].trim());
        }
        let text = ADDITIONAL_TERMS_RE.replace_all(text, "");
        let text = text.trim();

        let mut link_text = String::new();
        if let Some(caps) = QUOTED_RE.captures(text) {
            link_text = caps[1].to_owned();
        }
        let text = QUOTED_RE.replace_all(text, "$1");
        let text = text.trim();

        let (trigger, terms, default_text) = if let Some(caps) = QUERY_TRIGGER_RE.captures(text) {
            let terms = caps[2].trim().to_owned();
            (Some(caps[1].to_owned()), format!("{terms}{additional}"), terms)
        } else if let Some(caps) = QUERY_SOCIAL_RE.captures(text) {
            let handle = &caps[2];
            let letter = caps.get(1).map_or_else(
                || if handle.contains('@') { "m" } else { "t" },
                |m| m.as_str(),
            );
            let terms = format!("@{handle}");
            (Some(format!("@{letter}")), terms.clone(), terms)
        } else {
            (None, format!("{text}{additional}"), text.to_owned())
        };

        if let Some(trigger) = &trigger
            && !registry.is_valid_trigger(trigger)
            && !is_domain_trigger(trigger)
        {
            return SearchResult::failure(
                ErrorKind::InvalidTrigger {
                    suggestions: registry.suggestions(trigger),
                },
                "",
                link_text,
            );
        }

        if link_text.is_empty() && !config.empty_uses_page_title {
            link_text = default_text;
        }

        let request = DispatchRequest {
            trigger,
            terms,
            link_text,
            titleize: config.empty_uses_page_title,
            config: config.clone(),
        };
        self.dispatcher.resolve_directive(&request, 1)
    }
}

/// A link to a URL typed as the query, titled with its host.
fn url_result(text: &str) -> SearchResult {
    let url = if text.to_ascii_lowercase().starts_with("http") {
        text.to_owned()
    } else {
        format!("https://{text}")
    };
    let host = url
        .split_once("://")
        .map_or(url.as_str(), |(_, rest)| rest)
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host).to_owned();
    SearchResult::link(url, host.clone(), host)
}

/// `detail (match)`, or just the match when there is no detail.
fn detail(message: &str, text: &str) -> String {
    if message.is_empty() {
        text.to_owned()
    } else {
        format!("{message} ({text})")
    }
}

/// Run state filled in document order.
struct Assembly {
    links: LinkTable,
    markers: Markers,
    footer: Footer,
    report: ReportLog,
    /// Errors written into the output (debug enabled for the directive).
    shown: ErrorLog,
    all: ErrorLog,
    edits: BTreeMap<usize, LineEdits>,
    deleted: HashSet<usize>,
    clipboard: bool,
}

impl Assembly {
    fn new(source: &str) -> Self {
        Self {
            links: LinkTable::from_document(source),
            markers: Markers::from_document(source),
            footer: Footer::new(),
            report: ReportLog::new(),
            shown: ErrorLog::new(),
            all: ErrorLog::new(),
            edits: BTreeMap::new(),
            deleted: HashSet::new(),
            clipboard: false,
        }
    }

    fn error(&mut self, plan: &Planned, label: String, message: String) {
        let entry = LogEntry::new(Some(plan.position), message);
        tracing::warn!(line = plan.position.line, "({label}) {entry}");
        if plan.config.debug {
            self.shown.push(label.clone(), entry.clone());
        }
        self.all.push(label, entry);
    }

    fn report(&mut self, plan: &Planned, message: String) {
        if plan.config.report {
            self.report.push(LogEntry::new(Some(plan.position), message));
        }
    }

    fn replace(&mut self, plan: &Planned, to: String) {
        self.edits
            .entry(plan.line)
            .or_default()
            .add(plan.range.clone(), to);
    }

    fn assemble(&mut self, plan: &Planned, result: Option<SearchResult>) {
        match &plan.action {
            Action::Link => {}
            Action::InlineCode => {
                self.report(plan, format!("Match '{}' within an inline code block", plan.text));
            }
            Action::Fail { kind, detail: message } => {
                self.error(plan, kind.to_string(), detail(message, &plan.text));
            }
            Action::Footnote { link_text, note } => {
                let link_text = link_text.trim();
                let id = if !link_text.is_empty() && !link_text.contains(char::is_whitespace) {
                    link_text.to_owned()
                } else {
                    self.markers.next_footnote(plan.config.prefix_random)
                };
                self.footer.add_footnote(format!("[^{id}]: {note}"));
                self.replace(plan, format!("[^{id}]"));
                self.report(plan, format!("{} => Footnote {id}", plan.text));
            }
            Action::Search { modifiers, .. } => match result {
                Some(result) => self.substitute(plan, *modifiers, result),
                None => self.error(plan, ErrorKind::NoResults.to_string(), plan.text.clone()),
            },
        }
    }

    fn substitute(&mut self, plan: &Planned, modifiers: Modifiers, result: SearchResult) {
        if let ResultKind::Failure(kind) = &result.kind {
            self.error(plan, kind.to_string(), detail(&result.title, &plan.text));
            return;
        }
        for note in &result.notes {
            self.error(plan, note.kind.to_string(), note.message.clone());
        }

        let config = &plan.config;
        let title = (config.include_titles || result.force_title).then_some(result.title.as_str());

        let replacement = match result.kind {
            ResultKind::Embed | ResultKind::SpellingCorrection => Some(result.bare_text().to_owned()),
            _ if modifiers.ref_title => {
                if self.links.insert(&result.url, &result.link_text) {
                    self.footer.add_reference(render_link(
                        LinkForm::Definition,
                        &result.link_text,
                        &result.url,
                        title,
                    ));
                }
                self.deleted.insert(plan.line);
                None
            }
            _ if modifiers.clipboard || modifiers.url_only => Some(result.url.clone()),
            _ if config.inline => Some(render_link(
                LinkForm::Inline,
                &result.link_text,
                &result.url,
                title,
            )),
            _ => {
                let marker = if let Some(marker) = self.links.get(&result.url) {
                    marker.to_owned()
                } else {
                    let marker = self.markers.next_link(config.prefix_random);
                    self.links.insert(&result.url, &marker);
                    self.footer.add_reference(render_link(
                        LinkForm::Definition,
                        &marker,
                        &result.url,
                        title,
                    ));
                    marker
                };
                Some(render_link(LinkForm::Reference, &result.link_text, &marker, None))
            }
        };

        if modifiers.clipboard {
            self.clipboard = true;
        }
        if let Some(replacement) = replacement {
            self.replace(plan, replacement);
        }
        self.report(plan, format!("{} => {}", plan.text, result.url));
    }

    fn finish(
        mut self,
        lines: &[&str],
        config: &Config,
        single_line: bool,
        links: usize,
    ) -> Rewrite {
        let mut kept: Vec<String> = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            if self.deleted.contains(&index) {
                continue;
            }
            match self.edits.remove(&index) {
                Some(edits) => kept.push(edits.apply(line)),
                None => kept.push((*line).to_owned()),
            }
        }
        let mut output = kept.join("\n");

        let has_footer = !self.footer.is_empty();
        if has_footer {
            let body = output.trim_end();
            let separator = match body.lines().last() {
                None => "",
                Some(last) if is_definition_line(last) => "\n",
                Some(_) => "\n\n",
            };
            output = format!("{body}{separator}{}\n", self.footer.render());
        }

        if config.report && links > 0 && !self.clipboard && !(config.inline && single_line) {
            self.report.push(LogEntry::new(
                None,
                format!("Processed: {links} links, {} errors.", self.all.len()),
            ));
            output.push_str(&self.report.render());
        }

        if !self.clipboard && !self.shown.is_empty() {
            if single_line && !has_footer {
                let trailing_newline = output.ends_with('\n');
                output.truncate(output.trim_end().len());
                output.push_str(&self.shown.render(true));
                if trailing_newline {
                    output.push('\n');
                }
            } else {
                output.push_str(&self.shown.render(false));
            }
        }

        Rewrite {
            output,
            clipboard: self.clipboard,
            links,
            errors: self.all.lines(),
        }
    }
}
