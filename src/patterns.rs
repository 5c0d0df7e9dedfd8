//! Shared lexicons and compile-once regex patterns for the rule engine.
//!
//! Every stage matches against these tables rather than ad-hoc literals so
//! the vocabulary is auditable in one place. Regexes compile once via
//! `OnceLock` accessors.

use std::sync::OnceLock;

use regex::Regex;

/// Verbs that signal a concrete action when they lead a sentence or bullet.
pub const ACTION_VERBS: &[&str] = &[
    "add", "align", "audit", "automate", "build", "consolidate", "create", "cut", "define",
    "deprecate", "design", "draft", "enable", "evaluate", "extend", "fix", "implement", "improve",
    "instrument", "integrate", "investigate", "launch", "measure", "migrate", "move", "prioritize",
    "prototype", "reduce", "refactor", "remove", "replace", "rework", "ship", "shift",
    "simplify", "split", "standardize", "streamline", "test", "update", "write",
];

/// Schedule-change operator words (mutating an existing plan or date).
pub const CHANGE_OPERATORS: &[&str] = &[
    "accelerate", "bring forward", "defer", "delay", "descope", "extend", "move", "postpone",
    "pull in", "push", "push back", "reschedule", "shift", "slip",
];

/// Decision/commitment language.
pub const DECISION_MARKERS: &[&str] = &[
    "agreed", "approved", "committed to", "decided", "decision:", "go with", "locked",
    "sign-off", "signed off", "we will",
];

/// Calendar noise markers (meetings, invites, scheduling chatter).
pub const CALENDAR_MARKERS: &[&str] = &[
    "1:1", "agenda", "calendar", "invite", "meeting", "offsite", "standup", "sync up",
    "weekly sync",
];

/// Communication noise markers.
pub const COMMUNICATION_MARKERS: &[&str] = &[
    "cc ", "email", "follow up with", "loop in", "ping", "reach out", "reply to", "send the",
    "share the", "slack",
];

/// Micro-admin noise markers.
pub const MICRO_ADMIN_MARKERS: &[&str] = &[
    "book travel", "expense", "file a ticket", "order swag", "renew license", "submit timesheet",
    "timesheet",
];

/// Product nouns used for the target-object bonus and key-noun title fallback.
pub const PRODUCT_NOUNS: &[&str] = &[
    "api", "auth", "backend", "billing", "checkout", "dashboard", "editor", "export", "flow",
    "integration", "login", "mobile app", "notification", "onboarding", "page", "pipeline",
    "report", "search", "signup", "sync", "ui", "workflow",
];

/// Mechanism verbs counted toward initiative quality.
pub const MECHANISM_VERBS: &[&str] = &[
    "automate", "batch", "cache", "consolidate", "gamify", "instrument", "rank", "score",
    "standardize", "streamline", "template",
];

/// System/feature nouns counted toward initiative quality.
pub const SYSTEM_NOUNS: &[&str] = &[
    "algorithm", "dashboard", "engine", "framework", "model", "pipeline", "platform", "process",
    "rubric", "scorecard", "service", "system", "tool", "workflow",
];

/// Heading vocabulary marking a specification/framework section.
pub const SPEC_FRAMEWORK_HEADING_WORDS: &[&str] = &[
    "checklist", "criteria", "definition", "matrix", "methodology", "prioritization", "rubric",
    "scoring", "spec", "specification", "template",
];

/// Heading vocabulary marking a strategy-style section.
pub const STRATEGY_HEADING_WORDS: &[&str] = &[
    "approach", "direction", "framework", "philosophy", "playbook", "positioning", "principles",
    "strategy", "vision",
];

/// Heading vocabulary marking a timeline section.
pub const TIMELINE_HEADING_WORDS: &[&str] = &[
    "dates", "deadlines", "launch plan", "milestones", "roadmap", "schedule", "timeline",
];

/// Gamification vocabulary for the cluster override.
pub const GAMIFICATION_TOKENS: &[&str] = &[
    "achievements", "badges", "leaderboard", "levels", "points", "quests", "rewards", "streak",
    "xp",
];

/// Schedule-event words (a dated deliverable being discussed).
pub const SCHEDULE_EVENT_WORDS: &[&str] = &[
    "beta", "deadline", "freeze", "ga date", "go-live", "kickoff", "launch", "milestone",
    "release", "ship date",
];

/// Friction/complaint vocabulary for solution-shaped title synthesis.
pub const FRICTION_WORDS: &[&str] = &[
    "clicks", "clunky", "confusing", "cumbersome", "friction", "manual", "painful", "slow",
    "steps", "tedious", "workaround",
];

/// Negation phrases that zero a sentence score when an action verb co-occurs.
pub const NEGATION_PHRASES: &[&str] = &[
    "decided against", "do not", "don't", "no longer", "not going to", "shouldn't", "won't",
];

/// Completion/scheduling words that disqualify implicit-need phrasing.
pub const COMPLETION_WORDS: &[&str] = &[
    "completed", "done", "finished", "scheduled", "shipped",
];

/// Leading filler/hedge prefixes stripped by the title contract.
pub const FILLER_PREFIXES: &[&str] = &[
    "consider ", "idea:", "it would be nice to ", "maybe we could ", "maybe we should ",
    "perhaps we could ", "perhaps ", "proposal:", "request for ", "request to ", "suggestion:",
    "we could ", "we should ", "what if we ",
];

/// Weak verb → strong verb substitutions (only before a concrete object).
pub const WEAK_VERB_MAP: &[(&str, &str)] = &[
    ("consider", "evaluate"),
    ("explore", "evaluate"),
    ("look into", "investigate"),
    ("research", "investigate"),
];

/// Pronouns/generic words that cannot carry a title on their own.
pub const GENERIC_TITLE_WORDS: &[&str] = &[
    "a", "an", "and", "for", "it", "its", "of", "on", "or", "our", "stuff", "that", "the",
    "them", "these", "they", "things", "this", "those", "to", "we", "with",
];

/// Leading stopwords ignored by the vacuous-title check.
pub const TITLE_STOPWORDS: &[&str] = &["a", "an", "for", "on", "the", "to"];

// ---------------------------------------------------------------------------
// Compile-once regexes
// ---------------------------------------------------------------------------

/// ISO date (`2026-03-15`).
pub fn re_iso_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap())
}

/// Month-name date (`March 12`, `Mar 12`).
pub fn re_month_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(jan(uary)?|feb(ruary)?|mar(ch)?|apr(il)?|may|jun(e)?|jul(y)?|aug(ust)?|sep(tember)?|oct(ober)?|nov(ember)?|dec(ember)?)\s+\d{1,2}\b",
        )
        .unwrap()
    })
}

/// Ordinal day (`the 12th`).
pub fn re_ordinal_day() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bthe\s+\d{1,2}(st|nd|rd|th)\b").unwrap())
}

/// Explicit from→to shift (`from the 12th to the 19th`, `from March to May`).
pub fn re_from_to_shift() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bfrom\s+(?:the\s+)?[\w'-]+(?:\s+[\w'-]+)?\s+to\s+(?:the\s+)?[\w'-]+")
            .unwrap()
    })
}

/// Numeric duration (`2 weeks`, `3 sprints`, `one quarter` is not matched — digits only).
pub fn re_numeric_duration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b\d+\s*(day|week|month|quarter|sprint)s?\b").unwrap()
    })
}

/// Role-assignment phrasing (`PM to draft`, `Eng to prototype`, `Dana to own`).
pub fn re_role_assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(pm|eng|engineering|design|data|marketing|sales|ops|legal|qa|[A-Z][a-z]+)\s+to\s+([a-z]+)\b")
            .unwrap()
    })
}

/// Structured task syntax: checkbox, `TODO:`, or `@assignee` with a verb.
pub fn re_structured_task() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(^\s*[-*]\s*\[[ x]\]|\btodo\b\s*:|^\s*ai\s*:)").unwrap())
}

/// Strong directive-plus-verb phrasing (`we will ship`, `going to migrate`, `plan to cut`).
pub fn re_directive_verb() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(we\s+will|going\s+to|plan\s+to|planning\s+to|let's)\s+(\w+)").unwrap()
    })
}

/// Hedge-plus-directive phrasing (`we should add`, `we need to build`).
pub fn re_hedge_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(we\s+should|we\s+need\s+to|we\s+ought\s+to)\s+(\w+)").unwrap())
}

/// Implicit-need phrasing: need + capability word + purpose connective.
pub fn re_implicit_need() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bneeds?\b.{0,60}\b(a\s+way|ability|capability|option|better)\b.{0,80}\b(to|for|when)\b")
            .unwrap()
    })
}

/// PM-request phrasing: `users need`, `customers need`, `friction around`,
/// guarded `request to <verb>`, a direct `can you <verb>` ask, and recurring
/// complaint forms (`keep reporting`, `keeps asking`, `kept complaining`).
pub fn re_pm_request() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(users?\s+need|customers?\s+need|friction\s+around|request\s+to\s+[a-z]+|can\s+you\s+[a-z]+|ke(?:ep|eps|pt)\s+(?:asking|reporting|complaining|requesting))\b")
            .unwrap()
    })
}

/// Implicit pain plus context (`X is painful when Y`, `keeps breaking during Z`).
pub fn re_implicit_pain() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(painful|broken|breaks?|fails?|failing|frustrating|silently)\b.{0,80}\b(when|during|because|after|if)\b")
            .unwrap()
    })
}

/// Explicit change pattern with object capture (`shift X to Y`, `move X from A to B`).
pub fn re_change_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(move|shift|push|delay|postpone|extend|reschedule)\s+(the\s+)?([\w -]{2,40}?)\s+(from|to|by|until)\b")
            .unwrap()
    })
}

/// `by <gerund>` construction marking a proposal line.
pub fn re_by_gerund() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bby\s+\w+ing\b").unwrap())
}

/// Trailing deadline phrase stripped by the title contract
/// (`by Friday`, `by EOW`, `before March 12`, `by Q3`).
pub fn re_trailing_deadline() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s+(by|before|until)\s+(eow|eod|eoq|q[1-4]|monday|tuesday|wednesday|thursday|friday|next\s+\w+|the\s+\d{1,2}(st|nd|rd|th)|\w+\s+\d{1,2})\s*$")
            .unwrap()
    })
}

/// Leading list marker (`- `, `* `, `+ `, `1. `, checkbox).
pub fn re_list_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:[-*+]\s*(?:\[[ x]\]\s*)?|\d+[.)]\s+)").unwrap())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Case-insensitive containment check against a word list.
pub fn contains_any(text: &str, words: &[&str]) -> bool {
    let lower = text.to_lowercase();
    words.iter().any(|w| lower.contains(w))
}

/// First matching word from the list, in list order.
pub fn first_match<'a>(text: &str, words: &'a [&'a str]) -> Option<&'a str> {
    let lower = text.to_lowercase();
    words.iter().copied().find(|w| lower.contains(w))
}

/// Count distinct matching words from the list.
pub fn count_distinct(text: &str, words: &[&str]) -> usize {
    let lower = text.to_lowercase();
    words.iter().filter(|w| lower.contains(*w)).count()
}

/// Strip a leading list marker from a line.
pub fn strip_list_marker(line: &str) -> &str {
    match re_list_marker().find(line) {
        Some(m) if m.start() == 0 => &line[m.end()..],
        _ => line,
    }
}

/// Whether the text contains a concrete delta: a measurable, time-bounded
/// change expression (explicit date, date-to-date shift, or numeric duration).
pub fn has_concrete_delta(text: &str) -> bool {
    re_iso_date().is_match(text)
        || re_month_date().is_match(text)
        || re_numeric_duration().is_match(text)
        || (re_from_to_shift().is_match(text) && re_ordinal_day().is_match(text))
        || (contains_any(text, CHANGE_OPERATORS) && re_ordinal_day().is_match(text))
}

/// Whether the text mentions a schedule-event (launch, deadline, milestone...).
pub fn has_schedule_event(text: &str) -> bool {
    contains_any(text, SCHEDULE_EVENT_WORDS)
}

/// Whether a sentence starts with a recognized action verb (after any list marker).
pub fn starts_with_action_verb(sentence: &str) -> bool {
    let s = strip_list_marker(sentence).trim_start();
    let first = s
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("")
        .to_lowercase();
    ACTION_VERBS.contains(&first.as_str())
}

/// First word of a sentence, lowercased.
pub fn first_word(sentence: &str) -> String {
    sentence
        .trim_start()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concrete_delta_iso_date() {
        assert!(has_concrete_delta("Launch moved to 2026-03-15"));
    }

    #[test]
    fn concrete_delta_ordinal_shift() {
        assert!(has_concrete_delta("Move the launch from the 12th to the 19th."));
    }

    #[test]
    fn concrete_delta_duration() {
        assert!(has_concrete_delta("Extend the beta by 2 weeks"));
    }

    #[test]
    fn no_delta_in_strategy_talk() {
        assert!(!has_concrete_delta(
            "We should shift from enterprise to SMB customers."
        ));
    }

    #[test]
    fn action_verb_at_start() {
        assert!(starts_with_action_verb("- [ ] Build the export flow"));
        assert!(!starts_with_action_verb("The export flow is done"));
    }

    #[test]
    fn pm_request_phrasing() {
        assert!(re_pm_request().is_match("Users need better error visibility"));
        assert!(re_pm_request().is_match("There is friction around the signup flow"));
        assert!(re_pm_request().is_match("Users keep reporting that exports lose formatting"));
        assert!(re_pm_request().is_match("Can you put together a rollout checklist"));
    }

    #[test]
    fn role_assignment_phrasing() {
        assert!(re_role_assignment().is_match("PM to draft the one-pager"));
    }

    #[test]
    fn list_marker_stripping() {
        assert_eq!(strip_list_marker("- [ ] Ship it"), "Ship it");
        assert_eq!(strip_list_marker("2. Ship it"), "Ship it");
        assert_eq!(strip_list_marker("no marker"), "no marker");
    }
}
