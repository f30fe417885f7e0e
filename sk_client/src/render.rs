//! Plain-text rendering of library state for line mode.

use skillatics::api::{
    Achievements, BatchAnalytics, GamificationProfile, Leaderboard, PracticeQuestion,
    TestResultRecord, Topic, TopicAverage, TopicCatalog, UserRecord,
};
use skillatics::auth::User;
use skillatics::coding::{
    CodeEditor, CodingQuestion, CodingQuestionSummary, ResultTab, TestReport,
};
use skillatics::proctor::ViolationSummary;
use skillatics::test_session::{ActiveTest, TestOutcome};
use std::fmt::Write;

/// Option label shown before each choice
pub fn option_label(index: usize) -> char {
    (b'a' + (index % 26) as u8) as char
}

pub fn user(user: &User) -> String {
    let mut out = format!("{} <{}>\nRole: {}", user.name, user.email, user.role);
    for (label, value) in [
        ("Department", &user.department),
        ("Division", &user.division),
        ("Roll no", &user.roll_no),
        ("Year", &user.year_of_study),
        ("Mobile", &user.mobile),
    ] {
        if let Some(value) = value {
            let _ = write!(out, "\n{label}: {value}");
        }
    }
    out
}

pub fn question(active: &ActiveTest) -> String {
    let q = &active.question;
    let mut out = format!("Question {}", active.answered + 1);
    if let Some(difficulty) = active.difficulty.or(q.difficulty) {
        let _ = write!(out, "  (difficulty {difficulty})");
    }
    if let Some(topic) = &q.topic {
        let _ = write!(out, "  [{topic}]");
    }
    let _ = write!(out, "\n\n{}\n", q.text);

    for (i, option) in q.options.iter().enumerate() {
        let marker = if active.selected.as_deref() == Some(option.as_str()) {
            '>'
        } else {
            ' '
        };
        let _ = write!(out, "\n{marker} {}) {option}", option_label(i));
    }
    out
}

pub fn outcome(outcome: &TestOutcome) -> String {
    format!(
        "Test complete\nScore: {:.2}%\nCorrect: {} of {}",
        outcome.score, outcome.correct_questions, outcome.total_questions
    )
}

pub fn violations(summary: &ViolationSummary) -> String {
    if summary.total_violations == 0 {
        return "No proctoring violations recorded".to_string();
    }
    let mut out = format!(
        "Proctoring: {} violation(s) | tab switches {} | fullscreen exits {} | copy {} | paste {}",
        summary.total_violations,
        summary.tab_switches,
        summary.fullscreen_exits,
        summary.copy_attempts,
        summary.paste_attempts
    );
    for v in &summary.violations_log {
        let _ = write!(
            out,
            "\n  {} {:<16} {}",
            v.timestamp.format("%H:%M:%S"),
            v.kind,
            v.description
        );
    }
    out
}

pub fn topic_catalog(catalog: &TopicCatalog) -> String {
    if catalog.is_empty() {
        return "No topics published yet".to_string();
    }
    let mut out = String::new();
    for (heading, topics) in [
        ("General Aptitude", &catalog.general_aptitude),
        ("Technical Aptitude", &catalog.technical_aptitude),
    ] {
        if topics.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "{heading}");
        for topic in topics {
            let _ = writeln!(out, "  {:<26} {}", topic.id, topic.name);
        }
    }
    out.trim_end().to_string()
}

pub fn topic(topic: &Topic, questions: &[PracticeQuestion]) -> String {
    let mut out = format!("{} ({})\n", topic.name, topic.category);
    if !topic.theory.trim().is_empty() {
        let _ = write!(out, "\nTheory\n{}\n", topic.theory.trim());
    }
    if !topic.shortcuts.trim().is_empty() {
        let _ = write!(out, "\nShortcuts\n{}\n", topic.shortcuts.trim());
    }
    if !questions.is_empty() {
        let _ = write!(out, "\nPractice ({} questions)", questions.len());
        for (n, q) in questions.iter().enumerate() {
            let _ = write!(out, "\n{}. {}", n + 1, q.text);
            for (i, option) in q.options.iter().enumerate() {
                let _ = write!(out, "\n   {}) {option}", option_label(i));
            }
        }
    }
    out.trim_end().to_string()
}

pub fn admin_topics(topics: &[Topic]) -> String {
    if topics.is_empty() {
        return "No topics".to_string();
    }
    topics
        .iter()
        .map(|t| format!("{:<26} {:<20} {}", t.id, t.category, t.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn results(records: &[TestResultRecord], averages: &[TopicAverage]) -> String {
    if records.is_empty() {
        return "No tests taken yet".to_string();
    }

    let mut out = String::from("Recent tests");
    for r in records.iter().rev().take(10) {
        let _ = write!(
            out,
            "\n  {:<20} {:>6.2}%  {}/{}  {}",
            r.completed_at.as_deref().unwrap_or("-"),
            r.score,
            r.correct_questions,
            r.total_questions,
            r.section.as_deref().unwrap_or("Mixed")
        );
    }

    let mean = records.iter().map(|r| r.score).sum::<f64>() / records.len() as f64;
    let _ = write!(out, "\nAverage score: {mean:.2}% over {} test(s)", records.len());

    if !averages.is_empty() {
        out.push_str("\n\nBy topic");
        for a in averages {
            let _ = write!(
                out,
                "\n  {:<24} {:>6.2}%  ({} tests)",
                a.topic.as_deref().unwrap_or("Untagged"),
                a.avg_score,
                a.tests
            );
        }
    }
    out
}

pub fn batch(analytics: &BatchAnalytics) -> String {
    format!(
        "Tests taken: {}\nAverage score: {:.2}%\nAverage correct: {:.1} of {:.1}",
        analytics.tests, analytics.avg_score, analytics.avg_correct, analytics.avg_total
    )
}

pub fn gamification(profile: &GamificationProfile, achievements: Option<&Achievements>) -> String {
    let mut out = format!(
        "Level {}  |  {} XP  |  rank {}\nNext level: {}/{} XP ({}%)",
        profile.level,
        profile.xp,
        profile
            .rank
            .map_or_else(|| "-".to_string(), |r| format!("#{r}")),
        profile.xp_progress,
        profile.xp_needed,
        profile.progress_percentage
    );
    if !profile.badges.is_empty() {
        let names: Vec<_> = profile.badges.iter().map(|b| b.name.as_str()).collect();
        let _ = write!(out, "\nBadges: {}", names.join(", "));
    }
    if let Some(achievements) = achievements {
        let _ = write!(
            out,
            "\nAchievements: {}/{}",
            achievements.earned_count, achievements.total_count
        );
    }
    out
}

pub fn leaderboard(board: &Leaderboard) -> String {
    let mut out = format!("Leaderboard ({})", board.timeframe);
    if board.leaderboard.is_empty() {
        out.push_str("\n  nobody has earned XP yet");
    }
    for e in &board.leaderboard {
        let you = board
            .user_entry
            .as_ref()
            .is_some_and(|u| u.user_id == e.user_id);
        let _ = write!(
            out,
            "\n{} #{:<3} {:<24} L{:<3} {:>6} XP  {} badge(s)",
            if you { '*' } else { ' ' },
            e.rank,
            e.name,
            e.level,
            e.xp,
            e.badges
        );
    }
    if let Some(rank) = board.user_rank {
        let _ = write!(out, "\nYour rank: #{rank}");
    }
    out
}

pub fn users(users: &[UserRecord]) -> String {
    if users.is_empty() {
        return "No users".to_string();
    }
    users
        .iter()
        .map(|r| {
            format!(
                "{:<26} {:<12} {:<30} {}",
                r.user.id,
                r.user.role.to_string(),
                r.user.email,
                r.user.department.as_deref().unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn coding_catalog(questions: &[CodingQuestionSummary]) -> String {
    if questions.is_empty() {
        return "No coding questions found".to_string();
    }
    questions
        .iter()
        .map(|q| {
            format!(
                "{:<26} {:<6} {:<4} {}",
                q.id,
                format!("{:?}", q.status),
                q.acceptance.as_deref().unwrap_or(""),
                q.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn coding_question(question: &CodingQuestion) -> String {
    let mut out = format!("{} [{}]", question.text, question.label());
    if !question.description.is_empty() {
        let _ = write!(out, "\n\n{}", question.description);
    }
    let visible = question.visible_cases();
    for (n, case) in visible.iter().enumerate() {
        let _ = write!(
            out,
            "\n\nExample {}\n  input:    {}\n  expected: {}",
            n + 1,
            case.input,
            case.expected_output
        );
    }
    let hidden = question.test_cases.len() - visible.len();
    if hidden > 0 {
        let _ = write!(out, "\n\n+ {hidden} hidden test case(s) on submit");
    }
    out
}

pub fn report(report: &TestReport) -> String {
    let mut out = format!(
        "{} {}/{} test cases passed",
        if report.all_passed() { "✓" } else { "✗" },
        report.passed_tests,
        report.total_tests
    );
    for case in &report.test_results {
        let verdict = if case.passed { "pass" } else { "FAIL" };
        if case.hidden {
            let _ = write!(out, "\n  #{:<2} {verdict}  (hidden)", case.test_case);
            continue;
        }
        let _ = write!(out, "\n  #{:<2} {verdict}", case.test_case);
        if let Some(status) = &case.status {
            let _ = write!(out, "  {status}");
        }
        if !case.passed {
            if let Some(input) = &case.input {
                let _ = write!(out, "\n      input:    {input}");
            }
            if let Some(expected) = &case.expected_output {
                let _ = write!(out, "\n      expected: {expected}");
            }
            let _ = write!(
                out,
                "\n      actual:   {}",
                case.actual_output.as_deref().unwrap_or("")
            );
            if let Some(error) = case.error.as_deref().filter(|e| !e.is_empty()) {
                let _ = write!(out, "\n      error:    {error}");
            }
        }
    }
    out
}

/// Buffer with line numbers plus whichever result pane is active
pub fn editor(editor: &CodeEditor) -> String {
    let mut out = format!("-- {} --", editor.language());
    for (n, line) in editor.buffer().lines().enumerate() {
        let _ = write!(out, "\n{:>3} | {line}", n + 1);
    }
    match (editor.tab(), editor.report()) {
        (ResultTab::TestCases, Some(r)) => {
            let _ = write!(out, "\n\n{}", report(r));
        }
        _ if !editor.output().is_empty() => {
            let _ = write!(out, "\n\n{}", editor.output());
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillatics::auth::Role;
    use skillatics::coding::{CaseResult, Language};
    use skillatics::test_session::TestQuestion;

    fn case(n: u32, passed: bool, hidden: bool) -> CaseResult {
        CaseResult {
            test_case: n,
            passed,
            hidden,
            input: (!hidden).then(|| "1 2".to_string()),
            expected_output: (!hidden).then(|| "3".to_string()),
            actual_output: (!hidden).then(|| if passed { "3" } else { "4" }.to_string()),
            status: None,
            time: None,
            memory: None,
            error: None,
        }
    }

    #[test]
    fn test_option_labels() {
        assert_eq!(option_label(0), 'a');
        assert_eq!(option_label(3), 'd');
    }

    #[test]
    fn test_question_marks_selection() {
        let active = ActiveTest {
            session_id: "s1".to_string(),
            question: TestQuestion {
                id: "q1".to_string(),
                text: "Pick b".to_string(),
                options: vec!["a".to_string(), "b".to_string()],
                topic: Some("Logic".to_string()),
                difficulty: Some(2),
                category: None,
            },
            selected: Some("b".to_string()),
            answered: 0,
            difficulty: None,
        };
        let text = question(&active);
        assert!(text.starts_with("Question 1  (difficulty 2)  [Logic]"));
        assert!(text.contains("  a) a"));
        assert!(text.contains("> b) b"));
    }

    #[test]
    fn test_report_hides_hidden_case_details() {
        let r = TestReport {
            success: false,
            test_results: vec![case(1, true, false), case(2, false, false), case(3, false, true)],
            passed_tests: 1,
            total_tests: 3,
        };
        let text = report(&r);
        assert!(text.starts_with("✗ 1/3"));
        assert!(text.contains("actual:   4"));
        assert!(text.contains("#3  FAIL  (hidden)"));
        assert_eq!(text.matches("input:").count(), 1);
    }

    #[test]
    fn test_editor_shows_active_pane() {
        let mut e = CodeEditor::new(None, Language::Python);
        e.set_buffer("print(1)");
        let text = editor(&e);
        assert!(text.contains("  1 | print(1)"));
        assert!(!text.contains("passed"));
    }

    #[test]
    fn test_user_lists_known_fields() {
        let u = User {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@x.io".to_string(),
            role: Role::Student,
            department: Some("CSE".to_string()),
            mobile: None,
            gender: None,
            division: None,
            roll_no: None,
            year_of_study: None,
        };
        let text = user(&u);
        assert!(text.contains("Role: Student"));
        assert!(text.contains("Department: CSE"));
        assert!(!text.contains("Mobile"));
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(results(&[], &[]), "No tests taken yet");
    }

    #[test]
    fn test_no_violations() {
        assert_eq!(
            violations(&ViolationSummary::default()),
            "No proctoring violations recorded"
        );
    }
}
