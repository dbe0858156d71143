use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
};

use crate::{
    error::RouteTableError,
    models::{DeclaredMeta, RedirectTarget, ResolvedRoute, Role, RouteDescriptor, RouteMeta},
};

/// quiz_master_routes
///
/// The Quiz Master client's route declarations: public entry pages, the nested admin
/// layout (every child inherits `requiresAuth` and `role: admin`), and the user area.
pub fn quiz_master_routes() -> Vec<RouteDescriptor> {
    let user_only = DeclaredMeta::restricted(Role::User);

    vec![
        RouteDescriptor::new("/", "HomePage", "HomePage"),
        RouteDescriptor::new("/login", "Login", "Login"),
        RouteDescriptor::new("/register", "Register", "Register"),
        RouteDescriptor::new("/admin", "AdminLayout", "AdminLayout")
            .with_meta(DeclaredMeta::restricted(Role::Admin))
            .with_children(vec![
                RouteDescriptor::new("dashboard", "AdminDashboard", "AdminDashboard"),
                RouteDescriptor::new("subjects", "AdminSubjects", "ManageSubjects"),
                RouteDescriptor::new(
                    "subjects/:subjectId/chapters",
                    "AdminChapters",
                    "ManageChapters",
                ),
                RouteDescriptor::new("quizzes", "AdminQuizzes", "ManageQuizzes"),
                RouteDescriptor::new(
                    "quizzes/:quizId/questions",
                    "AdminQuestions",
                    "ManageQuestions",
                ),
                RouteDescriptor::new("users", "AdminUsers", "ManageUsers"),
                RouteDescriptor::new("summary", "AdminSummary", "AdminSummary"),
            ]),
        RouteDescriptor::new("/dashboard", "UserDashboard", "UserDashboard").with_meta(user_only),
        RouteDescriptor::new("/quiz/:quizId", "QuizAttempt", "QuizAttempt").with_meta(user_only),
        RouteDescriptor::new("/scores", "UserScores", "UserScores").with_meta(user_only),
        RouteDescriptor::new("/summary", "UserSummary", "UserSummary").with_meta(user_only),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Option<Segment> {
        match raw.strip_prefix(':') {
            Some("") => None,
            Some(name) => Some(Segment::Param(name.to_string())),
            None => Some(Segment::Literal(raw.to_string())),
        }
    }

    /// Key used to detect two declarations that would match the same paths.
    fn shape_key(&self) -> String {
        match self {
            Segment::Literal(text) => text.to_ascii_lowercase(),
            Segment::Param(_) => ":".to_string(),
        }
    }
}

/// RouteMatch
///
/// A successful resolution: the matched route and the values captured by its
/// `:param` segments.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a> {
    pub route: &'a ResolvedRoute,
    pub params: BTreeMap<String, String>,
}

/// RouteTable
///
/// An immutable, validated, flattened route table. Construction guarantees that the
/// three well-known redirect targets exist, so `target_path` is infallible.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<ResolvedRoute>,
    patterns: Vec<Vec<Segment>>,
    login_path: String,
    admin_dashboard_path: String,
    user_dashboard_path: String,
}

impl RouteTable {
    /// Flattens and validates a list of declarations.
    pub fn new(descriptors: Vec<RouteDescriptor>) -> Result<Self, RouteTableError> {
        let mut routes = Vec::new();
        let mut patterns = Vec::new();

        for descriptor in &descriptors {
            if !descriptor.path.starts_with('/') {
                return Err(RouteTableError::InvalidPath(descriptor.path.clone()));
            }
            flatten(descriptor, "", RouteMeta::default(), &mut routes, &mut patterns)?;
        }

        let mut names = HashSet::new();
        let mut shapes = HashSet::new();
        for (route, pattern) in routes.iter().zip(&patterns) {
            if let Some(name) = &route.name {
                if !names.insert(name.as_str()) {
                    return Err(RouteTableError::DuplicateName(name.clone()));
                }
            }
            let shape: Vec<String> = pattern.iter().map(Segment::shape_key).collect();
            if !shapes.insert(shape) {
                return Err(RouteTableError::DuplicatePath(route.path.clone()));
            }
        }

        let path_of = |target: RedirectTarget| {
            routes
                .iter()
                .find(|route| route.name.as_deref() == Some(target.route_name()))
                .map(|route| route.path.clone())
                .ok_or(RouteTableError::MissingTarget(target.route_name()))
        };

        let login_path = path_of(RedirectTarget::Login)?;
        // Unauthenticated callers are sent to login, so it has to stay reachable.
        if routes
            .iter()
            .any(|route| route.path == login_path && route.meta.requires_auth)
        {
            return Err(RouteTableError::ProtectedLogin(login_path));
        }
        let admin_dashboard_path = path_of(RedirectTarget::AdminDashboard)?;
        let user_dashboard_path = path_of(RedirectTarget::UserDashboard)?;

        Ok(Self {
            routes,
            patterns,
            login_path,
            admin_dashboard_path,
            user_dashboard_path,
        })
    }

    /// The built-in Quiz Master table.
    pub fn quiz_master() -> Result<Self, RouteTableError> {
        Self::new(quiz_master_routes())
    }

    /// Loads declarations from a JSON array of route descriptors.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RouteTableError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RouteTableError> {
        let descriptors: Vec<RouteDescriptor> = serde_json::from_str(raw)?;
        Self::new(descriptors)
    }

    pub fn routes(&self) -> &[ResolvedRoute] {
        &self.routes
    }

    pub fn by_name(&self, name: &str) -> Option<&ResolvedRoute> {
        self.routes
            .iter()
            .find(|route| route.name.as_deref() == Some(name))
    }

    pub fn target_path(&self, target: RedirectTarget) -> &str {
        match target {
            RedirectTarget::Login => &self.login_path,
            RedirectTarget::AdminDashboard => &self.admin_dashboard_path,
            RedirectTarget::UserDashboard => &self.user_dashboard_path,
        }
    }

    /// resolve
    ///
    /// Matches a requested location against the table. Query strings and fragments
    /// are ignored, a trailing slash is tolerated, and literal segments compare
    /// case-insensitively. When several routes match, the one with the most literal
    /// segments wins, earlier declarations breaking ties.
    pub fn resolve(&self, location: &str) -> Option<RouteMatch<'_>> {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let requested: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        self.routes
            .iter()
            .zip(&self.patterns)
            .filter_map(|(route, pattern)| {
                match_segments(pattern, &requested).map(|params| (route, pattern, params))
            })
            .rev()
            .max_by_key(|(_, pattern, _)| {
                pattern
                    .iter()
                    .filter(|segment| matches!(segment, Segment::Literal(_)))
                    .count()
            })
            .map(|(route, _, params)| RouteMatch { route, params })
    }
}

fn flatten(
    descriptor: &RouteDescriptor,
    parent_path: &str,
    inherited: RouteMeta,
    routes: &mut Vec<ResolvedRoute>,
    patterns: &mut Vec<Vec<Segment>>,
) -> Result<(), RouteTableError> {
    let full_path = join_path(parent_path, &descriptor.path)
        .ok_or_else(|| RouteTableError::InvalidPath(descriptor.path.clone()))?;

    let pattern = full_path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(Segment::parse)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| RouteTableError::InvalidPath(full_path.clone()))?;

    let meta = descriptor.meta.merge_onto(inherited);

    routes.push(ResolvedRoute {
        path: full_path.clone(),
        name: descriptor.name.clone(),
        component: descriptor.component.clone(),
        meta,
    });
    patterns.push(pattern);

    for child in &descriptor.children {
        flatten(child, &full_path, meta, routes, patterns)?;
    }

    Ok(())
}

// Child paths are relative unless they start with '/'. Empty child paths are rejected
// because they would shadow the parent.
fn join_path(parent: &str, path: &str) -> Option<String> {
    if path.starts_with('/') {
        return Some(path.to_string());
    }
    if path.is_empty() {
        return None;
    }
    Some(format!("{}/{}", parent.trim_end_matches('/'), path))
}

fn match_segments(pattern: &[Segment], requested: &[&str]) -> Option<BTreeMap<String, String>> {
    if pattern.len() != requested.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (segment, actual) in pattern.iter().zip(requested) {
        match segment {
            Segment::Literal(text) if text.eq_ignore_ascii_case(actual) => {}
            Segment::Literal(_) => return None,
            Segment::Param(name) => {
                params.insert(name.clone(), (*actual).to_string());
            }
        }
    }
    Some(params)
}
