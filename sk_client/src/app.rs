//! Command handlers and the line-mode test and code prompts.

use anyhow::{Context, Result, anyhow, bail};
use skillatics::api::{
    AnalyticsScope, ApiClient, ApiError, ApiResult, GenerateQuestions, NewQuestion,
    QuestionCategory, Timeframe,
};
use skillatics::auth::{OtpPurpose, ProfileUpdate, Role, Route, User};
use skillatics::coding::{CodingPractice, Language};
use skillatics::test_session::{SectionFilter, TestPhase, TestSessionFlow};
use std::io::{self, Write};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::cli::Command;
use crate::commands::{CodeCommand, TestCommand, parse_code_command, parse_test_command};
use crate::render;
use crate::tui_app::TestTui;

const TEST_HELP: &str = "\
  a, b, c ... or 1, 2, 3 ...   select an option
  answer <option>              select and submit
  submit                       submit the selected option
  status                       show the current question
  quit                         leave the test";

const UNPROCTORED_NOTICE: &str =
    "Line mode is not proctored. Run `test --tui` for a proctored attempt.";

const CODE_HELP: &str = "\
  <code>            append a line to the buffer
  :run              run against the visible test cases
  :submit           grade against every test case
  :show             print the buffer and results
  :reset            restore the starter code
  :clear            empty the buffer
  :lang <name>      python, java, cpp or javascript
  :tab output|cases switch the result pane
  :list [level]     list coding questions
  :load <id>        open a question
  :random           open a random question
  :quit             leave";

/// Backend errors as the user should read them
trait Friendly<T> {
    fn friendly(self) -> Result<T>;
}

impl<T> Friendly<T> for ApiResult<T> {
    fn friendly(self) -> Result<T> {
        self.map_err(|e| {
            log::debug!("Request failed: {e:?}");
            anyhow!(e.user_message())
        })
    }
}

/// Reads lines from stdin after printing a prompt
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` at end of input
    async fn read(&mut self, label: &str) -> Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }
}

pub struct App {
    api: ApiClient,
}

impl App {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn current_user(&self) -> Result<User> {
        self.api
            .session()
            .current_user()
            .ok_or_else(|| anyhow!("Not logged in"))
    }

    /// Run one command. `route` is what the guard settled on, if any.
    pub async fn dispatch(&self, command: Command, route: Option<Route>) -> Result<()> {
        match command {
            Command::Login { email, otp } => self.login(&email, otp).await,
            Command::Register { email, name } => self.register(&email, &name).await,
            Command::Logout => {
                self.api.logout().friendly()?;
                println!("Logged out.");
                Ok(())
            }
            Command::Whoami => {
                println!("{}", render::user(&self.current_user()?));
                Ok(())
            }
            Command::Dashboard => self.dashboard(route).await,
            Command::Profile(update) => self.profile(update).await,
            Command::Topics => {
                let catalog = self.api.topics().await.friendly()?;
                println!("{}", render::topic_catalog(&catalog));
                Ok(())
            }
            Command::Topic(id) => {
                let (topic, questions) =
                    tokio::try_join!(self.api.topic(&id), self.api.topic_questions(&id))
                        .friendly()?;
                println!("{}", render::topic(&topic, &questions));
                Ok(())
            }
            Command::Test { section, tui } => {
                if tui {
                    let terminal = ratatui::init();
                    let result = TestTui::new(self.api.clone(), section).run(terminal).await;
                    ratatui::restore();

                    let summary = result?;
                    match &summary.outcome {
                        Some(outcome) => println!("{}", render::outcome(outcome)),
                        None => println!("Test abandoned."),
                    }
                    println!("{}", render::violations(&summary.violations));
                    Ok(())
                } else {
                    self.take_test(section).await
                }
            }
            Command::Code { question, language } => self.code(question, language).await,
            Command::Results => {
                let (records, averages) =
                    tokio::try_join!(self.api.my_results(), self.api.my_topic_averages())
                        .friendly()?;
                println!("{}", render::results(&records, &averages));
                Ok(())
            }
            Command::Leaderboard { timeframe, limit } => self.leaderboard(timeframe, limit).await,
            Command::AdminUsers => {
                let users = self.api.list_users().await.friendly()?;
                println!("{}", render::users(&users));
                Ok(())
            }
            Command::AdminRole { user_id, role } => {
                self.api.update_user_role(&user_id, role).await.friendly()?;
                println!("Role of {user_id} set to {role}.");
                Ok(())
            }
            Command::AdminDepartment {
                user_id,
                department,
            } => {
                self.api
                    .update_user_department(&user_id, &department)
                    .await
                    .friendly()?;
                println!("Department of {user_id} set to {department}.");
                Ok(())
            }
            Command::AdminTopics => {
                let topics = self.api.admin_topics().await.friendly()?;
                println!("{}", render::admin_topics(&topics));
                Ok(())
            }
            Command::AdminQuestion {
                text,
                topic,
                difficulty,
                category,
                options,
                answer,
            } => {
                self.create_question(&text, &topic, difficulty, category, &options, &answer)
                    .await
            }
            Command::AdminImport(path) => self.import_csv(&path).await,
            Command::AdminGenerate {
                topic,
                difficulty,
                count,
            } => {
                let mut request = GenerateQuestions::new(topic);
                if let Some(difficulty) = difficulty {
                    request.difficulty = difficulty;
                }
                if let Some(count) = count {
                    request.count = count;
                }
                let report = self.api.generate_questions(&request).await.friendly()?;
                println!("Generated {} question(s) on {}.", report.generated, request.topic);
                Ok(())
            }
            Command::Help => {
                print!("{}", crate::cli::HELP);
                Ok(())
            }
        }
    }

    // === Auth ===

    async fn login(&self, email: &str, otp: Option<String>) -> Result<()> {
        let otp = match otp {
            Some(otp) => otp,
            None => {
                self.api
                    .request_otp(email, OtpPurpose::Login, None)
                    .await
                    .friendly()?;
                println!("A one-time code was sent to {email}.");
                self.read_otp().await?
            }
        };

        let user = self.api.login_with_otp(email, &otp, None).await.friendly()?;
        println!("Logged in.\n{}", render::user(&user));
        if user.role == Role::Student && user.mobile.is_none() {
            println!("\nYour profile is incomplete. Run: sk_client profile --mobile <number> ...");
        }
        Ok(())
    }

    async fn register(&self, email: &str, name: &str) -> Result<()> {
        self.api
            .request_otp(email, OtpPurpose::Register, Some(name))
            .await
            .friendly()?;
        println!("A one-time code was sent to {email}.");
        let otp = self.read_otp().await?;

        let user = self
            .api
            .login_with_otp(email, &otp, Some(name))
            .await
            .friendly()?;
        println!("Account created.\n{}", render::user(&user));
        Ok(())
    }

    async fn read_otp(&self) -> Result<String> {
        let mut prompt = Prompt::stdin();
        let otp = prompt
            .read("OTP: ")
            .await?
            .context("No code entered")?;
        Ok(otp.trim().to_string())
    }

    async fn profile(&self, update: ProfileUpdate) -> Result<()> {
        if update.is_empty() {
            println!("{}", render::user(&self.current_user()?));
            return Ok(());
        }

        match self.api.update_profile(&update).await.friendly()? {
            Some(user) => println!("Profile updated.\n{}", render::user(&user)),
            None => println!("Profile updated."),
        }
        Ok(())
    }

    // === Dashboards ===

    async fn dashboard(&self, route: Option<Route>) -> Result<()> {
        let user = self.current_user()?;
        println!("Welcome, {} ({})\n", user.name, user.role);

        match route {
            Some(Route::StudentDashboard) => {
                let (profile, achievements, records, averages) = tokio::try_join!(
                    self.api.gamification_profile(),
                    self.api.achievements(),
                    self.api.my_results(),
                    self.api.my_topic_averages(),
                )
                .friendly()?;
                println!("{}", render::gamification(&profile, Some(&achievements)));
                let recent = &records[records.len().saturating_sub(5)..];
                println!("\n{}", render::results(recent, &averages));
            }
            Some(Route::FacultyDashboard) => {
                let college = self
                    .api
                    .batch_analytics(&AnalyticsScope::college())
                    .await
                    .friendly()?;
                println!("College\n{}", render::batch(&college));

                if let Some(department) = user.department.as_deref() {
                    let scope = AnalyticsScope::department(department);
                    let (batch, students) = tokio::try_join!(
                        self.api.batch_analytics(&scope),
                        self.api.student_stats(&scope),
                    )
                    .friendly()?;
                    println!("\n{department}\n{}", render::batch(&batch));
                    println!("{} student(s) with results", students.len());
                }
            }
            Some(Route::AdminDashboard) => {
                let (users, topics) =
                    tokio::try_join!(self.api.list_users(), self.api.admin_topics()).friendly()?;
                let count = |role: Role| users.iter().filter(|u| u.user.role == role).count();
                println!(
                    "Users: {} ({} students, {} staff, {} admins)\nTopics: {}",
                    users.len(),
                    count(Role::Student),
                    count(Role::Faculty) + count(Role::Tpo),
                    count(Role::Admin),
                    topics.len()
                );
            }
            other => bail!("No dashboard for {other:?}"),
        }
        Ok(())
    }

    async fn leaderboard(&self, timeframe: Timeframe, limit: Option<u32>) -> Result<()> {
        let board = self.api.leaderboard(timeframe, limit).await.friendly()?;
        println!("{}", render::leaderboard(&board));
        Ok(())
    }

    // === Admin ===

    async fn create_question(
        &self,
        text: &str,
        topic: &str,
        difficulty: u8,
        category: QuestionCategory,
        options: &str,
        answer: &str,
    ) -> Result<()> {
        let question = NewQuestion::from_form(text, topic, difficulty, category, options, answer);
        let id = self.api.create_question(&question).await.friendly()?;
        println!("Question created ({id}).");
        Ok(())
    }

    async fn import_csv(&self, path: &Path) -> Result<()> {
        let contents = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("questions.csv");

        let report = self
            .api
            .import_questions_csv(file_name, contents)
            .await
            .friendly()?;
        println!("Imported {} question(s).", report.inserted);
        for error in &report.errors {
            println!("  {error}");
        }
        Ok(())
    }

    // === Adaptive test ===

    /// Line-mode test; no terminal events reach it, so it is not proctored
    async fn take_test(&self, section: SectionFilter) -> Result<()> {
        println!("{UNPROCTORED_NOTICE}");
        let flow = TestSessionFlow::new(self.api.clone());
        self.test_loop(&flow, section).await
    }

    async fn test_loop(
        &self,
        flow: &TestSessionFlow<ApiClient>,
        section: SectionFilter,
    ) -> Result<()> {
        let phase = flow
            .start(section)
            .await
            .map_err(|e| anyhow!(e.user_message()))?;
        if !show_phase(&phase) {
            return Ok(());
        }
        println!("\nType 'help' for commands.");

        let mut prompt = Prompt::stdin();
        while let Some(line) = prompt.read("\nanswer> ").await? {
            let submit = match parse_test_command(&line) {
                Ok(TestCommand::Choose(index)) => {
                    match flow.select_index(index) {
                        Ok(()) => {
                            if let Some(active) = flow.snapshot().active() {
                                println!("{}", render::question(active));
                            }
                        }
                        Err(e) => println!("{}", e.user_message()),
                    }
                    false
                }
                Ok(TestCommand::Answer(index)) => match flow.select_index(index) {
                    Ok(()) => true,
                    Err(e) => {
                        println!("{}", e.user_message());
                        false
                    }
                },
                Ok(TestCommand::Submit) => true,
                Ok(TestCommand::Status) => {
                    if let Some(active) = flow.snapshot().active() {
                        println!("{}", render::question(active));
                    }
                    false
                }
                Ok(TestCommand::Help) => {
                    println!("{TEST_HELP}");
                    false
                }
                Ok(TestCommand::Quit) => {
                    flow.reset();
                    println!("Test abandoned.");
                    return Ok(());
                }
                Err(e) => {
                    println!("{e}");
                    false
                }
            };

            if submit {
                match flow.submit().await {
                    Ok(phase) => {
                        if !show_phase(&phase) {
                            return Ok(());
                        }
                    }
                    Err(e) => println!("{}", e.user_message()),
                }
            }
        }
        Ok(())
    }

    // === Coding practice ===

    async fn code(&self, question: Option<String>, language: Language) -> Result<()> {
        let initial = match question {
            Some(id) => Some(self.api.coding_question(&id).await.friendly()?),
            None => None,
        };
        if let Some(question) = &initial {
            println!("{}\n", render::coding_question(question));
        }

        let practice = CodingPractice::new(self.api.clone(), initial, language);
        println!("{}\n\nType ':help' for commands.", render::editor(&practice.snapshot()));

        let mut prompt = Prompt::stdin();
        loop {
            let label = format!("{}> ", practice.snapshot().language());
            let Some(line) = prompt.read(&label).await? else {
                break;
            };

            let command = match parse_code_command(&line) {
                Ok(command) => command,
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            };

            match command {
                CodeCommand::Line(line) => practice.edit(|e| e.push_line(&line)),
                CodeCommand::Run => match practice.run().await {
                    Ok(_) => println!("{}", render::editor(&practice.snapshot())),
                    Err(e) => println!("{}", e.user_message()),
                },
                CodeCommand::Submit => match practice.submit().await {
                    Ok(report) => println!("{}", render::report(&report)),
                    Err(e) => println!("{}", e.user_message()),
                },
                CodeCommand::Reset => {
                    practice.reset();
                    println!("{}", render::editor(&practice.snapshot()));
                }
                CodeCommand::Clear => practice.edit(|e| e.set_buffer(String::new())),
                CodeCommand::Show => println!("{}", render::editor(&practice.snapshot())),
                CodeCommand::Language(language) => {
                    practice.switch_language(language);
                    println!("{}", render::editor(&practice.snapshot()));
                }
                CodeCommand::Tab(tab) => {
                    practice.edit(|e| e.set_tab(tab));
                    println!("{}", render::editor(&practice.snapshot()));
                }
                CodeCommand::Load(id) => {
                    self.open_question(&practice, self.api.coding_question(&id).await)
                }
                CodeCommand::Random => {
                    self.open_question(&practice, self.api.random_coding_question().await)
                }
                CodeCommand::List(level) => match self.api.coding_questions(level).await {
                    Ok(questions) => println!("{}", render::coding_catalog(&questions)),
                    Err(e) => println!("{}", e.user_message()),
                },
                CodeCommand::Help => println!("{CODE_HELP}"),
                CodeCommand::Quit => break,
            }
        }
        Ok(())
    }

    fn open_question(
        &self,
        practice: &CodingPractice<ApiClient>,
        fetched: Result<skillatics::coding::CodingQuestion, ApiError>,
    ) {
        match fetched {
            Ok(question) => {
                println!("{}\n", render::coding_question(&question));
                practice.load_question(question);
                println!("{}", render::editor(&practice.snapshot()));
            }
            Err(e) => println!("{}", e.user_message()),
        }
    }
}

/// Print the phase; false once there is nothing left to answer
fn show_phase(phase: &TestPhase) -> bool {
    match phase {
        TestPhase::Active(active) => {
            println!("\n{}", render::question(active));
            true
        }
        TestPhase::Complete(outcome) => {
            println!("\n{}", render::outcome(outcome));
            false
        }
        TestPhase::Error(message) => {
            println!("\n{message}");
            false
        }
        TestPhase::Idle | TestPhase::Loading => false,
    }
}
