//! Command-line surface: argument parsing and the route each command opens.

use anyhow::{Context, Result, bail};
use pico_args::Arguments;
use skillatics::api::{QuestionCategory, Timeframe};
use skillatics::auth::{GuardDecision, ProfileUpdate, Role, Route, User, guard};
use skillatics::coding::Language;
use skillatics::test_session::SectionFilter;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

pub const HELP: &str = "\
Terminal client for the Skillatics placement-readiness platform

USAGE:
  sk_client [OPTIONS] <COMMAND> [ARGS]

OPTIONS:
  --api URL             REST base URL  [env: SKILLATICS_API_URL, default: http://localhost:5000/api]
  --state-dir DIR       Session and log directory  [env: SKILLATICS_STATE_DIR, default: ~/.skillatics]

COMMANDS:
  login --email E [--otp CODE]          Log in with a one-time code
  register --email E --name N           Create an account
  logout                                Forget the stored session
  whoami                                Show the logged-in user
  dashboard                             Open your role's dashboard
  profile [--name N] [--mobile M] [--gender G] [--department D]
          [--division V] [--roll-no R] [--year Y]
                                        Show or complete your profile
  topics                                List learning topics
  topic <ID>                            Read a topic and its practice questions
  test [--section general|technical|mixed] [--tui]
                                        Take an adaptive test (proctored with --tui)
  code [--question ID] [--lang python|java|cpp|javascript]
                                        Coding practice
  results                               Your test history
  leaderboard [--timeframe all|weekly|monthly] [--limit N]
  admin users                           List users
  admin role <USER_ID> <ROLE>           Change a user's role
  admin department <USER_ID> <DEPT>     Change a user's department
  admin topics                          List topics
  admin question --text T --topic T --difficulty 1-5 --type aptitude|technical
                 --options 'a|b|c' --answer A
  admin import <CSV_FILE>               Bulk-import questions
  admin generate --topic T [--difficulty N] [--count N]

FLAGS:
  -h, --help            Print help information
";

/// One invocation of the client
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login {
        email: String,
        otp: Option<String>,
    },
    Register {
        email: String,
        name: String,
    },
    Logout,
    Whoami,
    Dashboard,
    Profile(ProfileUpdate),
    Topics,
    Topic(String),
    Test {
        section: SectionFilter,
        tui: bool,
    },
    Code {
        question: Option<String>,
        language: Language,
    },
    Results,
    Leaderboard {
        timeframe: Timeframe,
        limit: Option<u32>,
    },
    AdminUsers,
    AdminRole {
        user_id: String,
        role: Role,
    },
    AdminDepartment {
        user_id: String,
        department: String,
    },
    AdminTopics,
    AdminQuestion {
        text: String,
        topic: String,
        difficulty: u8,
        category: QuestionCategory,
        options: String,
        answer: String,
    },
    AdminImport(PathBuf),
    AdminGenerate {
        topic: String,
        difficulty: Option<u8>,
        count: Option<u32>,
    },
    Help,
}

impl Command {
    /// Only the full-screen test sees focus, paste and copy events, so it is
    /// the only proctored run
    pub fn is_proctored(&self) -> bool {
        matches!(self, Command::Test { tui: true, .. })
    }

    /// Page this command stands in for; `None` for commands that work
    /// with or without a session
    pub fn route(&self) -> Option<Route> {
        let route = match self {
            Command::Login { .. } => Route::Login,
            Command::Register { .. } => Route::Register,
            Command::Logout | Command::Help => return None,
            Command::Whoami | Command::Profile(_) => Route::CompleteProfile,
            Command::Dashboard => Route::Home,
            Command::Topics | Command::Topic(_) => Route::StudentGeneral,
            Command::Test { .. } => Route::Test,
            Command::Code { .. } => Route::CodingPractice,
            Command::Results => Route::Analytics,
            Command::Leaderboard { .. } => Route::Leaderboard,
            Command::AdminUsers
            | Command::AdminRole { .. }
            | Command::AdminDepartment { .. } => Route::ManageUsers,
            Command::AdminTopics => Route::AdminTopics,
            Command::AdminQuestion { .. }
            | Command::AdminImport(_)
            | Command::AdminGenerate { .. } => Route::AdminQuestions,
        };
        Some(route)
    }
}

/// Parsed invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub api_url: Option<String>,
    pub state_dir: Option<PathBuf>,
    pub command: Command,
}

/// Parse arguments (without the program name)
pub fn parse_args(args: Vec<OsString>) -> Result<Cli> {
    let mut pargs = Arguments::from_vec(args);

    if pargs.contains(["-h", "--help"]) {
        return Ok(Cli {
            api_url: None,
            state_dir: None,
            command: Command::Help,
        });
    }

    let api_url = pargs.opt_value_from_str("--api")?;
    let state_dir = pargs.opt_value_from_str("--state-dir")?;

    let Some(name) = pargs.subcommand()? else {
        return Ok(Cli {
            api_url,
            state_dir,
            command: Command::Help,
        });
    };

    let command = match name.as_str() {
        "login" => Command::Login {
            email: pargs.value_from_str("--email").context("login needs --email")?,
            otp: pargs.opt_value_from_str("--otp")?,
        },
        "register" => Command::Register {
            email: pargs
                .value_from_str("--email")
                .context("register needs --email")?,
            name: pargs.value_from_str("--name").context("register needs --name")?,
        },
        "logout" => Command::Logout,
        "whoami" => Command::Whoami,
        "dashboard" => Command::Dashboard,
        "profile" => Command::Profile(ProfileUpdate {
            name: pargs.opt_value_from_str("--name")?,
            mobile: pargs.opt_value_from_str("--mobile")?,
            gender: pargs.opt_value_from_str("--gender")?,
            department: pargs.opt_value_from_str("--department")?,
            division: pargs.opt_value_from_str("--division")?,
            roll_no: pargs.opt_value_from_str("--roll-no")?,
            year_of_study: pargs.opt_value_from_str("--year")?,
        }),
        "topics" => Command::Topics,
        "topic" => Command::Topic(pargs.free_from_str().context("topic needs an id")?),
        "test" => Command::Test {
            section: parse_opt(&mut pargs, "--section")?.unwrap_or_default(),
            tui: pargs.contains("--tui"),
        },
        "code" => Command::Code {
            question: pargs.opt_value_from_str("--question")?,
            language: parse_opt(&mut pargs, "--lang")?.unwrap_or_default(),
        },
        "results" => Command::Results,
        "leaderboard" => Command::Leaderboard {
            timeframe: parse_opt(&mut pargs, "--timeframe")?.unwrap_or_default(),
            limit: pargs.opt_value_from_str("--limit")?,
        },
        "admin" => parse_admin(&mut pargs)?,
        other => bail!("unknown command '{other}' (see --help)"),
    };

    let rest = pargs.finish();
    if !rest.is_empty() {
        bail!("unexpected arguments: {rest:?}");
    }

    Ok(Cli {
        api_url,
        state_dir,
        command,
    })
}

fn parse_admin(pargs: &mut Arguments) -> Result<Command> {
    let Some(action) = pargs.subcommand()? else {
        bail!("admin needs an action (users, role, department, topics, question, import, generate)");
    };

    let command = match action.as_str() {
        "users" => Command::AdminUsers,
        "role" => Command::AdminRole {
            user_id: pargs.free_from_str().context("admin role needs a user id")?,
            role: parse_free(pargs, "admin role needs a role")?,
        },
        "department" => Command::AdminDepartment {
            user_id: pargs
                .free_from_str()
                .context("admin department needs a user id")?,
            department: pargs
                .free_from_str()
                .context("admin department needs a department")?,
        },
        "topics" => Command::AdminTopics,
        "question" => Command::AdminQuestion {
            text: pargs.value_from_str("--text").context("--text is required")?,
            topic: pargs.value_from_str("--topic").context("--topic is required")?,
            difficulty: pargs
                .value_from_str("--difficulty")
                .context("--difficulty is required")?,
            category: parse_opt(pargs, "--type")?.unwrap_or(QuestionCategory::Aptitude),
            options: pargs
                .value_from_str("--options")
                .context("--options is required")?,
            answer: pargs.value_from_str("--answer").context("--answer is required")?,
        },
        "import" => Command::AdminImport(
            pargs
                .free_from_str()
                .context("admin import needs a CSV file")?,
        ),
        "generate" => Command::AdminGenerate {
            topic: pargs.value_from_str("--topic").context("--topic is required")?,
            difficulty: pargs.opt_value_from_str("--difficulty")?,
            count: pargs.opt_value_from_str("--count")?,
        },
        other => bail!("unknown admin action '{other}'"),
    };
    Ok(command)
}

/// Optional flag parsed through the type's `FromStr` with a `String` error
fn parse_opt<T>(pargs: &mut Arguments, key: &'static str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    pargs
        .opt_value_from_fn(key, |s| s.parse::<T>())
        .with_context(|| format!("invalid value for {key}"))
}

fn parse_free<T>(pargs: &mut Arguments, missing: &'static str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    pargs
        .free_from_fn(|s| s.parse::<T>())
        .context(missing)
}

/// Why a command was refused before it ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    LoginRequired,
    WrongRole { role: Role, route: Route },
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoginRequired => {
                write!(f, "Please log in first: sk_client login --email <you@college.edu>")
            }
            Self::WrongRole { role, route } => {
                write!(f, "{} accounts cannot open {}", role, route)
            }
        }
    }
}

impl std::error::Error for AccessDenied {}

/// Run the route guard for `command`.
///
/// # Returns
///
/// * `Ok(Some(route))` - The route that renders (for `dashboard`, the role's dashboard)
/// * `Ok(None)` - The command has no route
/// * `Err(AccessDenied)` - The guard redirected away from the route
pub fn authorize(command: &Command, user: Option<&User>) -> Result<Option<Route>, AccessDenied> {
    let Some(route) = command.route() else {
        return Ok(None);
    };

    if route == Route::Home {
        return match user {
            Some(_) => Ok(Some(guard(route, user).settle(user))),
            None => Err(AccessDenied::LoginRequired),
        };
    }

    match guard(route, user) {
        GuardDecision::Render(route) => Ok(Some(route)),
        GuardDecision::Redirect(Route::Login) => Err(AccessDenied::LoginRequired),
        GuardDecision::Redirect(_) => match user {
            Some(user) => Err(AccessDenied::WrongRole {
                role: user.role,
                route,
            }),
            None => Err(AccessDenied::LoginRequired),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<OsString> {
        line.split_whitespace().map(OsString::from).collect()
    }

    fn user(role: Role) -> User {
        User {
            id: "u1".to_string(),
            name: "Test".to_string(),
            email: "t@x.io".to_string(),
            role,
            department: None,
            mobile: None,
            gender: None,
            division: None,
            roll_no: None,
            year_of_study: None,
        }
    }

    #[test]
    fn test_parse_test_command() {
        let cli = parse_args(args("--api http://h:1/api test --section technical --tui")).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://h:1/api"));
        assert_eq!(
            cli.command,
            Command::Test {
                section: SectionFilter::Technical,
                tui: true
            }
        );
    }

    #[test]
    fn test_parse_defaults() {
        let cli = parse_args(args("code")).unwrap();
        assert_eq!(
            cli.command,
            Command::Code {
                question: None,
                language: Language::Python
            }
        );
        let cli = parse_args(args("test")).unwrap();
        assert_eq!(
            cli.command,
            Command::Test {
                section: SectionFilter::Mixed,
                tui: false
            }
        );
    }

    #[test]
    fn test_only_full_screen_test_is_proctored() {
        assert!(parse_args(args("test --tui")).unwrap().command.is_proctored());
        assert!(!parse_args(args("test")).unwrap().command.is_proctored());
        assert!(!parse_args(args("code")).unwrap().command.is_proctored());
    }

    #[test]
    fn test_parse_admin_role() {
        let cli = parse_args(args("admin role 64f1 TPO/Faculty")).unwrap();
        assert_eq!(
            cli.command,
            Command::AdminRole {
                user_id: "64f1".to_string(),
                role: Role::Faculty
            }
        );
    }

    #[test]
    fn test_parse_login_requires_email() {
        assert!(parse_args(args("login")).is_err());
        let cli = parse_args(args("login --email a@b.io --otp 123456")).unwrap();
        assert_eq!(
            cli.command,
            Command::Login {
                email: "a@b.io".to_string(),
                otp: Some("123456".to_string())
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(parse_args(args("test --section history")).is_err());
        assert!(parse_args(args("leaderboard --timeframe yearly")).is_err());
        assert!(parse_args(args("frobnicate")).is_err());
        assert!(parse_args(args("whoami extra")).is_err());
    }

    #[test]
    fn test_no_command_is_help() {
        assert_eq!(parse_args(Vec::new()).unwrap().command, Command::Help);
        assert_eq!(parse_args(args("-h")).unwrap().command, Command::Help);
    }

    #[test]
    fn test_anonymous_test_requires_login() {
        let command = Command::Test {
            section: SectionFilter::Mixed,
            tui: false,
        };
        assert_eq!(authorize(&command, None), Err(AccessDenied::LoginRequired));
    }

    #[test]
    fn test_student_cannot_manage_users() {
        let student = user(Role::Student);
        let err = authorize(&Command::AdminUsers, Some(&student)).unwrap_err();
        assert_eq!(
            err,
            AccessDenied::WrongRole {
                role: Role::Student,
                route: Route::ManageUsers
            }
        );
    }

    #[test]
    fn test_dashboard_settles_on_role_dashboard() {
        for (role, route) in [
            (Role::Student, Route::StudentDashboard),
            (Role::Tpo, Route::FacultyDashboard),
            (Role::Admin, Route::AdminDashboard),
        ] {
            let u = user(role);
            assert_eq!(authorize(&Command::Dashboard, Some(&u)), Ok(Some(route)));
        }
        assert_eq!(
            authorize(&Command::Dashboard, None),
            Err(AccessDenied::LoginRequired)
        );
    }

    #[test]
    fn test_logout_needs_no_session() {
        assert_eq!(authorize(&Command::Logout, None), Ok(None));
    }

    #[test]
    fn test_login_is_public() {
        let command = Command::Login {
            email: "a@b.io".to_string(),
            otp: None,
        };
        assert_eq!(authorize(&command, None), Ok(Some(Route::Login)));
    }
}
