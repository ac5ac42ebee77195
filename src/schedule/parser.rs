// File: ./src/schedule/parser.rs
// Line-oriented state machine joining the roster table and the calendar tables by colour.
use crate::model::{DutyDate, DutyPerson};
use crate::schedule::months::{MonthTable, format_duty_date};
use crate::schedule::tokenizer::{break_tags, fragments};
use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

// `\w` is ASCII only here, so localized class names and mail local parts do not match.
const CONTACT_COLOUR: &str = r"<td.*?(rgb\([^)]+\)|highlight-(?-u:\w)+)";
const CONTACT_EMAIL: &str = r"(?-u:[\w.])+@\S+";
const CONTACT_SLACK: &str = r#"https://.*slack.com/messages/([^"]+)"#;
const MONTH_HEADER: &str = r"(\S+), (\d+)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Looking for the next coloured roster cell.
    Contacts,
    /// Colour captured, waiting for the display name.
    Name,
    /// Collecting email and chat handle until the row closes.
    ContactInfo,
    /// Inside the calendar sections.
    Schedule,
    /// The next fragment is the text of a day cell.
    Day,
}

#[derive(Debug, Clone)]
struct Patterns {
    contact_colour: Regex,
    email: Regex,
    slack: Regex,
    month_header: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            contact_colour: Regex::new(CONTACT_COLOUR).expect("static colour pattern"),
            email: Regex::new(CONTACT_EMAIL).expect("static email pattern"),
            slack: Regex::new(CONTACT_SLACK).expect("static chat pattern"),
            month_header: Regex::new(MONTH_HEADER).expect("static month pattern"),
        }
    }
}

/// Extracts the duty roster from an exported wiki page.
///
/// The page holds a roster table, one coloured row per person, followed by
/// calendar tables whose day cells reuse the row colours. The parser keeps
/// no state between calls; one instance can serve any number of pages.
#[derive(Debug, Clone)]
pub struct ScheduleParser {
    patterns: Patterns,
    months: MonthTable,
}

impl Default for ScheduleParser {
    fn default() -> Self {
        Self::new(MonthTable::default())
    }
}

impl ScheduleParser {
    pub fn new(months: MonthTable) -> Self {
        Self {
            patterns: Patterns::new(),
            months,
        }
    }

    pub fn months(&self) -> &MonthTable {
        &self.months
    }

    /// Parses `markup` using the local calendar date as "today".
    pub fn parse_today(&self, markup: &str) -> Vec<DutyPerson> {
        self.parse(markup, Local::now().date_naive())
    }

    /// Parses `markup`, flagging the person whose duty falls on `today`.
    ///
    /// Never fails: fragments that match nothing are skipped, and a page
    /// without a roster table yields an empty roster.
    pub fn parse(&self, markup: &str, today: NaiveDate) -> Vec<DutyPerson> {
        let broken = break_tags(markup);
        let mut walk = Walk::new(self, today);
        for line in fragments(&broken) {
            walk.step(line);
        }
        walk.finish()
    }
}

/// Mutable state of a single parse.
struct Walk<'p> {
    parser: &'p ScheduleParser,
    today: NaiveDate,
    state: State,
    roster: Vec<DutyPerson>,
    pending: DutyPerson,
    month: String,
    active: usize,
    current: Option<usize>,
}

impl<'p> Walk<'p> {
    fn new(parser: &'p ScheduleParser, today: NaiveDate) -> Self {
        Self {
            parser,
            today,
            state: State::Contacts,
            roster: Vec::new(),
            pending: DutyPerson::default(),
            month: String::new(),
            active: 0,
            current: None,
        }
    }

    fn step(&mut self, line: &str) {
        match self.state {
            State::Contacts => self.contacts(line),
            State::Name => self.name(line),
            State::ContactInfo => self.contact_info(line),
            State::Schedule => self.schedule(line),
            State::Day => self.day(line),
        }
    }

    fn contacts(&mut self, line: &str) {
        if line == "</table>" {
            log::debug!("Roster table closed with {} entries", self.roster.len());
            self.state = State::Schedule;
            return;
        }
        if let Some(caps) = self.parser.patterns.contact_colour.captures(line) {
            self.pending.colour = caps[1].to_string();
            self.state = State::Name;
        }
    }

    fn name(&mut self, line: &str) {
        if line.is_empty() || line.contains(['<', '>']) {
            return;
        }
        self.pending.name = line.to_string();
        self.pending.current = false;
        self.state = State::ContactInfo;
    }

    fn contact_info(&mut self, line: &str) {
        let patterns = &self.parser.patterns;
        if let Some(m) = patterns.email.find(line) {
            self.pending.email = Some(m.as_str().to_string());
        }
        if let Some(caps) = patterns.slack.captures(line) {
            self.pending.slack = Some(caps[0].to_string());
            self.pending.slack_short = Some(caps[1].to_string());
        }
        if line == "</tr>" {
            let person = std::mem::take(&mut self.pending);
            log::trace!("Roster entry {:?} ({})", person.name, person.colour);
            self.roster.push(person);
            self.state = State::Contacts;
        }
    }

    fn schedule(&mut self, line: &str) {
        // Headers are bare text; inside a tag "rgb(255, 0, 0)" would read as month "rgb(255".
        if !line.contains(['<', '>'])
            && let Some(caps) = self.parser.patterns.month_header.captures(line)
        {
            self.month = caps[1].to_string();
        }
        // First entry in roster order wins when colours overlap as substrings.
        if let Some(index) = self
            .roster
            .iter()
            .position(|p| line.contains(p.colour.as_str()))
        {
            self.active = index;
            self.state = State::Day;
        }
    }

    fn day(&mut self, line: &str) {
        let day = line.parse::<i32>().unwrap_or(0);
        let month = self.parser.months.resolve(&self.month);
        let record = DutyDate {
            month: self.month.clone(),
            day,
            date: format_duty_date(self.today.year(), month.unwrap_or(0), day),
        };

        let is_today = i64::from(day) == i64::from(self.today.day())
            && month == Some(self.today.month());
        if is_today {
            if let Some(previous) = self.current.filter(|&i| i != self.active) {
                self.roster[previous].clear_current();
            }
            self.roster[self.active].set_current(record.clone());
            self.current = Some(self.active);
        }

        self.roster[self.active].duty.push(record);
        self.state = State::Schedule;
    }

    fn finish(self) -> Vec<DutyPerson> {
        if self.state != State::Schedule && self.state != State::Day && !self.roster.is_empty() {
            log::warn!("Page ended before the roster table was closed");
        }
        log::debug!(
            "Parsed {} duty persons with {} duty dates",
            self.roster.len(),
            self.roster.iter().map(|p| p.duty.len()).sum::<usize>()
        );
        self.roster
    }
}
