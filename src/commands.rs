//! Browse-session commands and autocomplete logic

use clap::ValueEnum;

use crate::storefront::types::{Category, Region};

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "search",
    aliases: &["s", "find"],
    usage: "search [query]",
    description: "Search curated products (blank for the aisle's best)",
  },
  Command {
    name: "category",
    aliases: &["c", "aisle"],
    usage: "category [name|all]",
    description: "Filter products by category",
  },
  Command {
    name: "region",
    aliases: &["r", "market"],
    usage: "region <us|eu|kr|jp|au>",
    description: "Switch the market",
  },
  Command {
    name: "prices",
    aliases: &["p", "buy", "compare"],
    usage: "prices <product>",
    description: "Compare places to buy a product",
  },
  Command {
    name: "insights",
    aliases: &["i", "trends"],
    usage: "insights",
    description: "Market and care trends for the region",
  },
  Command {
    name: "resources",
    aliases: &["l", "local", "near"],
    usage: "resources <location>",
    description: "Support services near a location",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "List commands",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit silversage",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    let priority = if cmd.name == input_lower {
      0
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      1
    } else if cmd.name.starts_with(&input_lower) {
      2
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      3
    } else if cmd.name.contains(&input_lower) {
      4
    } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      5
    } else {
      continue;
    };
    matches.push((cmd, priority));
  }

  matches.sort_by_key(|(_, priority)| *priority);
  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Search(String),
  /// `None` clears the filter
  Category(Option<Category>),
  Region(Region),
  Prices(String),
  Insights,
  Resources(String),
  Help,
  Quit,
}

/// Parse one line typed into the browse session.
///
/// The first word selects the command by its best suggestion; the rest of the
/// line is the argument.
pub fn parse_line(line: &str) -> Result<Action, String> {
  let line = line.trim();
  let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
  let rest = rest.trim();

  if word.is_empty() {
    return Err("Type a command, or 'help'".to_string());
  }

  let Some(cmd) = get_suggestions(word).first().copied() else {
    return Err(format!("Unknown command '{}'", word));
  };

  let action = match cmd.name {
    "search" => Action::Search(rest.to_string()),
    "category" => {
      if rest.is_empty() || rest.eq_ignore_ascii_case("all") {
        Action::Category(None)
      } else {
        let category =
          Category::parse(rest).ok_or_else(|| format!("Unknown category '{}'", rest))?;
        Action::Category(Some(category))
      }
    }
    "region" => {
      let region = Region::from_str(rest, true).map_err(|_| {
        format!("Unknown region '{}', expected one of us, eu, kr, jp, au", rest)
      })?;
      Action::Region(region)
    }
    "prices" => Action::Prices(required(rest, cmd)?),
    "insights" => Action::Insights,
    "resources" => Action::Resources(required(rest, cmd)?),
    "help" => Action::Help,
    _ => Action::Quit,
  };

  Ok(action)
}

fn required(rest: &str, cmd: &Command) -> Result<String, String> {
  if rest.is_empty() {
    Err(format!("Usage: {}", cmd.usage))
  } else {
    Ok(rest.to_string())
  }
}
