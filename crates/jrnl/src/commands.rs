//! Terminal command parser

use journalnav::{EntryId, PageDescriptor};

/// A line of user input, decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Click equivalent: open a page
    Navigate(PageDescriptor),
    Back,
    Forward,
    List,
    History,
    Stats,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  home, h1            show the entry list
  settings, img       open settings
  entry <N>, <N>      open entry N
  #entry<N>           open a page by URL fragment
  back, forward       move through history
  list                reprint the current page
  history             show session history
  stats               show offline cache counters
  help                this text
  quit                exit";

/// Decode one input line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let command = match words.next() {
        Some(word) => word.to_lowercase(),
        None => return Ok(None),
    };
    let args: Vec<&str> = words.collect();

    let input = match command.as_str() {
        // The original page's header and gear icon
        "home" | "h1" => Input::Navigate(PageDescriptor::Home),
        "settings" | "img" => Input::Navigate(PageDescriptor::Settings),
        "entry" => match args.as_slice() {
            [n] => Input::Navigate(PageDescriptor::entry(parse_id(n)?)),
            _ => return Err("usage: entry <N>".to_string()),
        },
        "back" | "b" => Input::Back,
        "forward" | "f" => Input::Forward,
        "list" | "ls" => Input::List,
        "history" => Input::History,
        "stats" => Input::Stats,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        fragment if fragment.starts_with('#') => {
            let page = PageDescriptor::from_url(fragment).map_err(|e| e.to_string())?;
            Input::Navigate(page)
        }
        n if n.bytes().all(|b| b.is_ascii_digit()) => {
            Input::Navigate(PageDescriptor::entry(parse_id(n)?))
        }
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };

    if !args.is_empty() && command != "entry" {
        return Err(format!("'{}' takes no arguments", command));
    }
    Ok(Some(input))
}

fn parse_id(s: &str) -> Result<EntryId, String> {
    s.parse().map_err(|e: journalnav::Error| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u32) -> Input {
        Input::Navigate(PageDescriptor::entry(EntryId::new(n).unwrap()))
    }

    #[test]
    fn test_parse_pages() {
        assert_eq!(parse("home").unwrap(), Some(Input::Navigate(PageDescriptor::Home)));
        assert_eq!(parse("H1").unwrap(), Some(Input::Navigate(PageDescriptor::Home)));
        assert_eq!(
            parse("  Settings ").unwrap(),
            Some(Input::Navigate(PageDescriptor::Settings))
        );
        assert_eq!(parse("entry 3").unwrap(), Some(entry(3)));
        assert_eq!(parse("12").unwrap(), Some(entry(12)));
    }

    #[test]
    fn test_parse_fragment() {
        assert_eq!(parse("#entry4").unwrap(), Some(entry(4)));
        assert_eq!(
            parse("#settings").unwrap(),
            Some(Input::Navigate(PageDescriptor::Settings))
        );
        assert!(parse("#bogus").is_err());
    }

    #[test]
    fn test_parse_controls() {
        assert_eq!(parse("back").unwrap(), Some(Input::Back));
        assert_eq!(parse("f").unwrap(), Some(Input::Forward));
        assert_eq!(parse("history").unwrap(), Some(Input::History));
        assert_eq!(parse("stats").unwrap(), Some(Input::Stats));
        assert_eq!(parse("?").unwrap(), Some(Input::Help));
        assert_eq!(parse("QUIT").unwrap(), Some(Input::Quit));
    }

    #[test]
    fn test_parse_blank() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   \t").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("entry").is_err());
        assert!(parse("entry 0").is_err());
        assert!(parse("entry x").is_err());
        assert!(parse("0").is_err());
        assert!(parse("home now").is_err());
        assert!(parse("launch").is_err());
    }
}
