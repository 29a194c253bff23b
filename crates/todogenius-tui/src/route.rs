/// Top-level views, addressed by path like the web client's router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Tasks,
    Context,
    NotFound(String),
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let trimmed = path.trim();
        let normalized = trimmed.trim_end_matches('/');
        match normalized {
            "" | "/tasks" | "tasks" => Route::Tasks,
            "/context" | "context" => Route::Context,
            _ => Route::NotFound(trimmed.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Tasks => "/tasks",
            Route::Context => "/context",
            Route::NotFound(p) => p,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Tasks => "Tasks",
            Route::Context => "Context",
            Route::NotFound(_) => "Not Found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_paths() {
        assert_eq!(Route::parse("/"), Route::Tasks);
        assert_eq!(Route::parse("/tasks"), Route::Tasks);
        assert_eq!(Route::parse("/tasks/"), Route::Tasks);
        assert_eq!(Route::parse("/context"), Route::Context);
    }

    #[test]
    fn unknown_path_is_not_found() {
        assert_eq!(Route::parse("/settings"), Route::NotFound("/settings".into()));
        assert_eq!(Route::parse("/settings").path(), "/settings");
    }
}
