use log::LevelFilter;
use padel_core::GameConfig;

pub const DEFAULT_MATCH_ID: &str = "local";

/// Match selection and format overrides given on the command line.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatchOptions {
    pub match_id: Option<String>,
    pub team1: Option<String>,
    pub team2: Option<String>,
    pub sets_to_win: Option<u32>,
    pub games_per_set: Option<u32>,
    pub golden_point: bool,
    pub no_tie_break: bool,
}

impl MatchOptions {
    /// Format requested on the command line, or None when no format flag was given
    /// (a stored or backend format then wins).
    pub fn game_config(&self) -> Option<GameConfig> {
        let overridden = self.sets_to_win.is_some()
            || self.games_per_set.is_some()
            || self.golden_point
            || self.no_tie_break;
        if !overridden {
            return None;
        }
        let base = GameConfig::default();
        Some(GameConfig {
            sets_to_win: self.sets_to_win.unwrap_or(base.sets_to_win),
            games_per_set: self.games_per_set.unwrap_or(base.games_per_set),
            no_advantage: self.golden_point,
            tie_break_enabled: !self.no_tie_break,
        })
    }
}

#[derive(Debug, PartialEq)]
pub enum CliAction {
    Run(MatchOptions),
    Help,
    Version,
}

pub fn parse_args<I>(args: I) -> Result<CliAction, String>
where
    I: IntoIterator<Item = String>,
{
    let mut options = MatchOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-V" | "--version" => return Ok(CliAction::Version),
            "-m" | "--match" => options.match_id = Some(value_for(&arg, args.next())?),
            "--team1" => options.team1 = Some(value_for(&arg, args.next())?),
            "--team2" => options.team2 = Some(value_for(&arg, args.next())?),
            "--sets" => options.sets_to_win = Some(number_for(&arg, args.next())?),
            "--games" => options.games_per_set = Some(number_for(&arg, args.next())?),
            "--golden-point" => options.golden_point = true,
            "--no-tiebreak" => options.no_tie_break = true,
            _ => return Err(format!("Unknown argument: {arg}")),
        }
    }

    if let Some(config) = options.game_config() {
        config.validate().map_err(|e| e.to_string())?;
    }
    Ok(CliAction::Run(options))
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("{flag} needs a value"))
}

fn number_for(flag: &str, value: Option<String>) -> Result<u32, String> {
    let value = value_for(flag, value)?;
    value
        .parse()
        .map_err(|_| format!("{flag} expects a number, got {value:?}"))
}

#[derive(Debug, Default, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub options: MatchOptions,
}

impl AppSettings {
    pub fn load(options: MatchOptions) -> Self {
        let log_level = std::env::var("PADELFLOW_LOG")
            .ok()
            .and_then(|level| level.trim().parse::<LevelFilter>().ok());
        Self {
            full_screen: false,
            log_level,
            options,
        }
    }

    pub fn match_id(&self) -> String {
        self.options
            .match_id
            .clone()
            .or_else(|| {
                std::env::var("PADELFLOW_MATCH_ID")
                    .ok()
                    .filter(|id| !id.trim().is_empty())
            })
            .unwrap_or_else(|| DEFAULT_MATCH_ID.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliAction, String> {
        parse_args(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn no_arguments_runs_with_defaults() {
        let action = parse(&[]).unwrap();
        assert_eq!(action, CliAction::Run(MatchOptions::default()));
        let CliAction::Run(options) = action else { unreachable!() };
        assert_eq!(options.game_config(), None);
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse(&["--team1", "A", "--help"]).unwrap(), CliAction::Help);
        assert_eq!(parse(&["-V"]).unwrap(), CliAction::Version);
    }

    #[test]
    fn format_flags_build_a_config() {
        let CliAction::Run(options) =
            parse(&["--match", "m-42", "--sets", "1", "--games", "9", "--golden-point"]).unwrap()
        else {
            panic!("expected run");
        };
        assert_eq!(options.match_id.as_deref(), Some("m-42"));
        assert_eq!(
            options.game_config(),
            Some(GameConfig {
                sets_to_win: 1,
                games_per_set: 9,
                no_advantage: true,
                tie_break_enabled: true,
            })
        );
    }

    #[test]
    fn no_tiebreak_keeps_the_default_format_otherwise() {
        let CliAction::Run(options) = parse(&["--no-tiebreak"]).unwrap() else {
            panic!("expected run");
        };
        let config = options.game_config().unwrap();
        assert!(!config.tie_break_enabled);
        assert_eq!(config.sets_to_win, 2);
        assert_eq!(config.games_per_set, 6);
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(parse(&["--bogus"]).unwrap_err().contains("--bogus"));
        assert!(parse(&["--match"]).unwrap_err().contains("needs a value"));
        assert!(parse(&["--sets", "two"]).unwrap_err().contains("expects a number"));
        assert!(parse(&["--games", "0"]).is_err());
    }
}
