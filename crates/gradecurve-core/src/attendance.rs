//! Attendance ledger and its compact string encoding.
//!
//! A ledger is stored as text like `"1P2P3A4L"`: a session number followed by
//! a single status glyph, repeated with no delimiter.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attendance status for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    /// Canonical glyph written by [`encode`].
    pub fn glyph(self) -> char {
        match self {
            AttendanceStatus::Present => 'P',
            AttendanceStatus::Absent => 'A',
            AttendanceStatus::Late => 'L',
        }
    }

    /// Parse a glyph. Hangul glyphs from legacy ledgers are accepted too.
    pub fn from_glyph(c: char) -> Option<Self> {
        match c {
            'P' | '출' => Some(AttendanceStatus::Present),
            'A' | '결' => Some(AttendanceStatus::Absent),
            'L' | '지' => Some(AttendanceStatus::Late),
            _ => None,
        }
    }

    /// Present and late sessions both count toward attendance.
    pub fn counts_as_present(self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "present"),
            AttendanceStatus::Absent => write!(f, "absent"),
            AttendanceStatus::Late => write!(f, "late"),
        }
    }
}

/// Session number to status, ordered by session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceLedger {
    sessions: BTreeMap<u32, AttendanceStatus>,
}

impl AttendanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status of a session. Later writes win; session 0 is ignored.
    pub fn record(&mut self, session: u32, status: AttendanceStatus) {
        if session == 0 {
            tracing::warn!("ignoring attendance for session 0");
            return;
        }
        self.sessions.insert(session, status);
    }

    /// Apply an approved excuse: the session becomes present, late included.
    pub fn excuse(&mut self, session: u32) {
        self.record(session, AttendanceStatus::Present);
    }

    pub fn get(&self, session: u32) -> Option<AttendanceStatus> {
        self.sessions.get(&session).copied()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, AttendanceStatus)> + '_ {
        self.sessions.iter().map(|(&n, &s)| (n, s))
    }

    /// Highest recorded session number.
    pub fn last_session(&self) -> Option<u32> {
        self.sessions.keys().next_back().copied()
    }

    /// Count statuses over sessions `1..=total_sessions`.
    pub fn tally(&self, total_sessions: u32) -> AttendanceTally {
        let mut tally = AttendanceTally::default();
        if total_sessions == 0 {
            return tally;
        }
        for (_, status) in self.sessions.range(1..=total_sessions) {
            match status {
                AttendanceStatus::Present => tally.present += 1,
                AttendanceStatus::Absent => tally.absent += 1,
                AttendanceStatus::Late => tally.late += 1,
            }
        }
        tally
    }
}

/// Status counts for a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceTally {
    pub present: u32,
    pub late: u32,
    pub absent: u32,
}

impl AttendanceTally {
    /// Sessions that count as attended.
    pub fn present_equivalent(&self) -> u32 {
        self.present + self.late
    }
}

/// Parse a ledger string leniently.
///
/// Each entry is a run of digits followed by one status glyph. Anything that
/// does not fit that shape is skipped, including a trailing number with no glyph.
pub fn decode(text: &str) -> AttendanceLedger {
    let mut ledger = AttendanceLedger::new();
    let mut digits = String::new();
    let mut skipped = 0usize;

    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        match AttendanceStatus::from_glyph(c) {
            Some(status) if !digits.is_empty() => match digits.parse::<u32>() {
                Ok(session) if session > 0 => ledger.record(session, status),
                _ => skipped += 1,
            },
            _ => skipped += 1,
        }
        digits.clear();
    }
    if !digits.is_empty() {
        skipped += 1;
    }

    if skipped > 0 {
        tracing::warn!(skipped, "ignored malformed fragments in attendance ledger");
    }
    ledger
}

/// Render a ledger with canonical glyphs in ascending session order.
pub fn encode(ledger: &AttendanceLedger) -> String {
    let mut out = String::with_capacity(ledger.len() * 3);
    for (session, status) in ledger.iter() {
        out.push_str(&session.to_string());
        out.push(status.glyph());
    }
    out
}

/// Attendance rate as `"attended/total"`.
///
/// Every recorded session counts, including ones past `total_sessions`.
pub fn rate(ledger: &AttendanceLedger, total_sessions: u32) -> String {
    let attended = ledger
        .iter()
        .filter(|(_, status)| status.counts_as_present())
        .count();
    format!("{attended}/{total_sessions}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_basic_ledger() {
        let ledger = decode("1P2P3A4L5P");
        assert_eq!(ledger.len(), 5);
        assert_eq!(ledger.get(3), Some(AttendanceStatus::Absent));
        assert_eq!(ledger.get(4), Some(AttendanceStatus::Late));
        let tally = ledger.tally(5);
        assert_eq!(tally.present, 3);
        assert_eq!(tally.late, 1);
        assert_eq!(tally.absent, 1);
    }

    #[test]
    fn decode_multi_digit_sessions() {
        let ledger = decode("10P2A123L");
        assert_eq!(ledger.get(10), Some(AttendanceStatus::Present));
        assert_eq!(ledger.get(2), Some(AttendanceStatus::Absent));
        assert_eq!(ledger.get(123), Some(AttendanceStatus::Late));
    }

    #[test]
    fn decode_duplicates_last_write_wins() {
        let ledger = decode("1P1A1L");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(1), Some(AttendanceStatus::Late));
    }

    #[test]
    fn decode_ignores_malformed_fragments() {
        let ledger = decode("1P2X3A4");
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get(1), Some(AttendanceStatus::Present));
        assert_eq!(ledger.get(3), Some(AttendanceStatus::Absent));
        assert!(ledger.get(4).is_none());

        assert!(decode("").is_empty());
        assert!(decode("PPP").is_empty());
        assert!(decode("0P").is_empty());
        assert!(decode("99999999999P").is_empty());
    }

    #[test]
    fn decode_accepts_hangul_glyphs() {
        let ledger = decode("1출2결3지");
        assert_eq!(ledger.get(1), Some(AttendanceStatus::Present));
        assert_eq!(ledger.get(2), Some(AttendanceStatus::Absent));
        assert_eq!(ledger.get(3), Some(AttendanceStatus::Late));
        assert_eq!(encode(&ledger), "1P2A3L");
    }

    #[test]
    fn encode_sorts_by_session() {
        let mut ledger = AttendanceLedger::new();
        ledger.record(10, AttendanceStatus::Late);
        ledger.record(2, AttendanceStatus::Present);
        ledger.record(1, AttendanceStatus::Absent);
        assert_eq!(encode(&ledger), "1A2P10L");
    }

    #[test]
    fn rate_counts_late_as_present() {
        let ledger = decode("1P2P3A4L5P");
        assert_eq!(rate(&ledger, 5), "4/5");
        assert_eq!(rate(&AttendanceLedger::new(), 80), "0/80");
    }

    #[test]
    fn rate_counts_sessions_past_total() {
        let ledger = decode("1P2P3P");
        assert_eq!(rate(&ledger, 2), "3/2");
        assert_eq!(rate(&decode("1P5A9L"), 3), "2/3");
    }

    #[test]
    fn excuse_marks_session_present() {
        let mut ledger = decode("1A2L");
        ledger.excuse(1);
        ledger.excuse(2);
        ledger.excuse(7);
        assert_eq!(ledger.get(1), Some(AttendanceStatus::Present));
        assert_eq!(ledger.get(2), Some(AttendanceStatus::Present));
        assert_eq!(ledger.get(7), Some(AttendanceStatus::Present));
        assert_eq!(encode(&ledger), "1P2P7P");
    }

    #[test]
    fn tally_ignores_sessions_past_total() {
        let ledger = decode("1P2P3P");
        assert_eq!(ledger.tally(2).present, 2);
        assert_eq!(ledger.last_session(), Some(3));
    }
}
