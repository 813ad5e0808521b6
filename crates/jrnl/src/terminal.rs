//! Plain-text rendering of the viewport

use std::io::{self, Write};

use journalnav::{EntryList, MemoryViewPort, SessionHistory, VisualMode};

const RULE: &str = "----------------------------------------";

/// Print the page the viewport currently shows
pub fn render<W: Write>(out: &mut W, view: &MemoryViewPort, entries: &EntryList) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{}    <{}>", view.title(), view.history().location())?;
    writeln!(out, "{}", RULE)?;

    let mode = view.mode();
    if mode.contains(VisualMode::SETTINGS) {
        writeln!(out, "(no settings yet)")?;
    } else if mode.contains(VisualMode::SINGLE_ENTRY) {
        match view.entry_view() {
            Some(entry_view) => {
                let entry = &entry_view.entry;
                writeln!(out, "{}", entry.title)?;
                if let Some(date) = &entry.date {
                    writeln!(out, "{}", date)?;
                }
                writeln!(out)?;
                writeln!(out, "{}", entry.content)?;
                for (key, value) in &entry.extra {
                    writeln!(out, "{}: {}", key, value)?;
                }
            }
            None => writeln!(out, "(entry not loaded)")?,
        }
    } else if entries.is_empty() {
        writeln!(out, "(no entries)")?;
    } else {
        for (id, entry) in entries.iter() {
            match &entry.date {
                Some(date) => writeln!(out, "[{}] {} ({})", id, entry.title, date)?,
                None => writeln!(out, "[{}] {}", id, entry.title)?,
            }
        }
    }
    Ok(())
}

/// Print session history with the current record marked
pub fn render_history<W: Write>(out: &mut W, history: &SessionHistory) -> io::Result<()> {
    for (i, record) in history.records().iter().enumerate() {
        let marker = if i == history.cursor() { '>' } else { ' ' };
        let state = match &record.state {
            Some(page) => serde_json::to_string(page).unwrap_or_default(),
            None => "null".to_string(),
        };
        writeln!(out, "{} {:>3} {} {}", marker, i, record.url, state)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use journalnav::{EntryId, EntryRecord, Navigator, PageDescriptor};

    const ORIGIN: &str = "http://localhost:8080";

    fn navigator() -> Navigator<MemoryViewPort, EntryList> {
        let mut entries = EntryList::new();
        let mut trip = EntryRecord::new("Trip", "Went hiking.");
        trip.date = Some("4/20/2021".to_string());
        entries.push(trip);
        entries.push(EntryRecord::new("Groceries", "Eggs"));
        Navigator::new(MemoryViewPort::new(ORIGIN), entries, ORIGIN)
    }

    fn rendered(nav: &Navigator<MemoryViewPort, EntryList>) -> String {
        let mut out = Vec::new();
        render(&mut out, nav.view(), nav.entries()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_render_home_lists_entries() {
        let text = rendered(&navigator());
        assert!(text.contains("Journal Entries    <http://localhost:8080>"));
        assert!(text.contains("[1] Trip (4/20/2021)"));
        assert!(text.contains("[2] Groceries"));
    }

    #[test]
    fn test_render_entry() {
        let mut nav = navigator();
        nav.transition(Some(PageDescriptor::entry(EntryId::new(1).unwrap())), false)
            .unwrap();
        let text = rendered(&nav);
        assert!(text.contains("Entry 1    <http://localhost:8080#entry1>"));
        assert!(text.contains("Trip\n4/20/2021\n\nWent hiking."));
        assert!(!text.contains("[2]"));
    }

    #[test]
    fn test_render_settings() {
        let mut nav = navigator();
        nav.transition(Some(PageDescriptor::Settings), false).unwrap();
        let text = rendered(&nav);
        assert!(text.contains("Settings    <http://localhost:8080#settings>"));
        assert!(text.contains("(no settings yet)"));
    }

    #[test]
    fn test_render_empty_list() {
        let nav = Navigator::new(MemoryViewPort::new(ORIGIN), EntryList::new(), ORIGIN);
        assert!(rendered(&nav).contains("(no entries)"));
    }

    #[test]
    fn test_render_history() {
        let mut nav = navigator();
        nav.transition(Some(PageDescriptor::Settings), false).unwrap();
        let mut out = Vec::new();
        render_history(&mut out, nav.view().history()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(' '));
        assert!(lines[0].ends_with("null"));
        assert_eq!(
            lines[1],
            r#">   1 http://localhost:8080#settings {"page":"settings"}"#
        );
    }
}
