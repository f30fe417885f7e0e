//! Route table and role-based access decisions.

use super::models::{Role, User};
use std::fmt;

/// Every page the client can navigate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    CompleteProfile,
    Test,
    StudentDashboard,
    StudentGeneral,
    StudentTechnical,
    CodingPractice,
    GamifiedAssessment,
    Analytics,
    Leaderboard,
    FacultyDashboard,
    AdminDashboard,
    ManageUsers,
    AdminQuestions,
    AdminTopics,
}

/// Who may render a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

const STUDENT: &[Role] = &[Role::Student];
const STAFF: &[Role] = &[Role::Faculty, Role::Tpo, Role::Admin];
const ADMIN: &[Role] = &[Role::Admin];

impl Route {
    pub const ALL: [Route; 17] = [
        Route::Home,
        Route::Login,
        Route::Register,
        Route::CompleteProfile,
        Route::Test,
        Route::StudentDashboard,
        Route::StudentGeneral,
        Route::StudentTechnical,
        Route::CodingPractice,
        Route::GamifiedAssessment,
        Route::Analytics,
        Route::Leaderboard,
        Route::FacultyDashboard,
        Route::AdminDashboard,
        Route::ManageUsers,
        Route::AdminQuestions,
        Route::AdminTopics,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::CompleteProfile => "/complete-profile",
            Route::Test => "/test",
            Route::StudentDashboard => "/student",
            Route::StudentGeneral => "/student/general",
            Route::StudentTechnical => "/student/technical",
            Route::CodingPractice => "/coding-practice",
            Route::GamifiedAssessment => "/gamified-assessment",
            Route::Analytics => "/analytics",
            Route::Leaderboard => "/leaderboard",
            Route::FacultyDashboard => "/faculty",
            Route::AdminDashboard => "/admin",
            Route::ManageUsers => "/admin/manage-users",
            Route::AdminQuestions => "/admin/questions",
            Route::AdminTopics => "/admin/topics",
        }
    }

    /// Look up a route by path; a single trailing slash is ignored
    pub fn from_path(path: &str) -> Option<Route> {
        let normalized = match path.strip_suffix('/') {
            Some(rest) if !rest.is_empty() => rest,
            _ => path,
        };
        Route::ALL.into_iter().find(|r| r.path() == normalized)
    }

    pub const fn access(self) -> Access {
        match self {
            Route::Home | Route::Login | Route::Register => Access::Public,
            Route::CompleteProfile | Route::Test | Route::Leaderboard => Access::Authenticated,
            Route::StudentDashboard
            | Route::StudentGeneral
            | Route::StudentTechnical
            | Route::CodingPractice
            | Route::GamifiedAssessment
            | Route::Analytics => Access::Roles(STUDENT),
            Route::FacultyDashboard => Access::Roles(STAFF),
            Route::AdminDashboard
            | Route::ManageUsers
            | Route::AdminQuestions
            | Route::AdminTopics => Access::Roles(ADMIN),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of checking a navigation against the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect(Route),
}

impl GuardDecision {
    /// Follow redirects until a route renders.
    ///
    /// Redirect targets are always dashboards, `/login`, or `/`, so this
    /// settles in at most two hops.
    pub fn settle(self, user: Option<&User>) -> Route {
        let mut decision = self;
        for _ in 0..Route::ALL.len() {
            match decision {
                GuardDecision::Render(route) => return route,
                GuardDecision::Redirect(route) => decision = guard(route, user),
            }
        }
        Route::Login
    }
}

/// Decide whether `route` renders for `user` or where to send them instead.
///
/// * Anonymous visit to a protected route → `/login`
/// * Logged-in visit with a role outside the allowed set → `/`
/// * `/` with a session → the role's dashboard
pub fn guard(route: Route, user: Option<&User>) -> GuardDecision {
    if route == Route::Home {
        return match user {
            Some(user) => GuardDecision::Redirect(user.role.dashboard()),
            None => GuardDecision::Render(Route::Home),
        };
    }

    match (route.access(), user) {
        (Access::Public, _) => GuardDecision::Render(route),
        (_, None) => GuardDecision::Redirect(Route::Login),
        (Access::Authenticated, Some(_)) => GuardDecision::Render(route),
        (Access::Roles(allowed), Some(user)) => {
            if allowed.contains(&user.role) {
                GuardDecision::Render(route)
            } else {
                log::debug!("{} may not open {}, redirecting home", user.role, route);
                GuardDecision::Redirect(Route::Home)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: "u".to_string(),
            name: "U".to_string(),
            email: "u@x.io".to_string(),
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
    fn test_paths_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }

    #[test]
    fn test_trailing_slash_ignored() {
        assert_eq!(Route::from_path("/admin/"), Some(Route::AdminDashboard));
        assert_eq!(Route::from_path("/"), Some(Route::Home));
        assert_eq!(Route::from_path("/nope"), None);
    }

    #[test]
    fn test_anonymous_protected_redirects_to_login() {
        assert_eq!(
            guard(Route::AdminDashboard, None),
            GuardDecision::Redirect(Route::Login)
        );
        assert_eq!(guard(Route::Test, None), GuardDecision::Redirect(Route::Login));
    }

    #[test]
    fn test_wrong_role_redirects_home() {
        let student = user(Role::Student);
        assert_eq!(
            guard(Route::AdminDashboard, Some(&student)),
            GuardDecision::Redirect(Route::Home)
        );
    }

    #[test]
    fn test_home_redirects_by_role() {
        for role in Role::ALL {
            let u = user(role);
            assert_eq!(
                guard(Route::Home, Some(&u)),
                GuardDecision::Redirect(role.dashboard())
            );
        }
        assert_eq!(guard(Route::Home, None), GuardDecision::Render(Route::Home));
    }

    #[test]
    fn test_settle_lands_on_dashboard() {
        let student = user(Role::Student);
        let landed = guard(Route::ManageUsers, Some(&student)).settle(Some(&student));
        assert_eq!(landed, Route::StudentDashboard);
    }

    #[test]
    fn test_every_role_can_render_its_dashboard() {
        for role in Role::ALL {
            let u = user(role);
            let dashboard = role.dashboard();
            assert_eq!(guard(dashboard, Some(&u)), GuardDecision::Render(dashboard));
        }
    }

    #[test]
    fn test_faculty_dashboard_open_to_admin() {
        let admin = user(Role::Admin);
        assert_eq!(
            guard(Route::FacultyDashboard, Some(&admin)),
            GuardDecision::Render(Route::FacultyDashboard)
        );
    }

    #[test]
    fn test_public_routes_render_for_everyone() {
        assert_eq!(guard(Route::Login, None), GuardDecision::Render(Route::Login));
        let admin = user(Role::Admin);
        assert_eq!(
            guard(Route::Register, Some(&admin)),
            GuardDecision::Render(Route::Register)
        );
    }
}
