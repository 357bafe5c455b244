use crate::messages::{Locale, Messages};
use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Session state shared by every line the interpreter executes.
///
/// The environment contains:
/// - `vars`: shell variables bound by `name=value` assignments. Bindings live for the
///   whole session and are only ever overwritten, never removed.
/// - `current_dir`: the directory relative file names are resolved against.
/// - `messages`: the catalog used for every user-facing diagnostic.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    current_dir: PathBuf,
    messages: Messages,
}

impl Environment {
    /// Start an empty session rooted at the process working directory.
    ///
    /// When the working directory cannot be read (it was removed, or a parent is
    /// not searchable) an absolute `$PWD` is used instead. Failing that the session
    /// is rooted at the relative path `.`, so file names still resolve against the
    /// process directory but `pwd` prints `.` rather than an absolute path.
    pub fn new() -> Self {
        Self::with_dir(process_dir())
    }

    /// Start an empty session rooted at `dir`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: dir.into(),
            messages: Messages::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.messages = Messages::new(locale);
        self
    }

    /// Value bound to `name`, or the empty string when it was never assigned.
    pub fn lookup(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or("")
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Resolve a file name given on the command line.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.current_dir.join(name)
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }
}

fn process_dir() -> PathBuf {
    if let Ok(dir) = stdenv::current_dir() {
        return dir;
    }
    match stdenv::var_os("PWD").map(PathBuf::from) {
        Some(dir) if dir.is_absolute() => dir,
        _ => {
            tracing::warn!("working directory is unreadable, using `.`");
            PathBuf::from(".")
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;
    use crate::messages::Locale;
    use std::env as stdenv;

    #[test]
    fn test_env_assign_and_lookup() {
        let mut env = Environment::with_dir("/tmp");

        // unbound names read as empty
        assert_eq!(env.lookup("SOME_RANDOM_VAR_12345"), "");

        env.assign("x", "1");
        assert_eq!(env.lookup("x"), "1");

        env.assign("x", "2");
        assert_eq!(env.lookup("x"), "2");
    }

    #[test]
    fn test_env_does_not_read_process_vars() {
        let env = Environment::new();
        assert_eq!(env.lookup("PATH"), "");
        assert_eq!(env.current_dir(), stdenv::current_dir().unwrap());
    }

    #[test]
    fn test_env_new_is_rooted_at_an_absolute_dir() {
        let env = Environment::new();
        assert!(env.current_dir().is_absolute());
        assert_eq!(env.resolve("a.txt"), stdenv::current_dir().unwrap().join("a.txt"));
    }

    #[test]
    fn test_env_resolve() {
        let env = Environment::with_dir("/data").with_locale(Locale::En);
        assert_eq!(env.resolve("a.txt"), std::path::PathBuf::from("/data/a.txt"));
        assert_eq!(env.resolve("/etc/hosts"), std::path::PathBuf::from("/etc/hosts"));
        assert_eq!(env.messages().locale(), Locale::En);
    }
}
