use std::path::Path;

use watchcmd::errors::WatchcmdError;
use watchcmd::types::PatternSyntax;
use watchcmd::watch::PatternFilter;

#[test]
fn regex_is_unanchored_and_case_sensitive() {
    let filter = PatternFilter::new("rs", None, PatternSyntax::Regex).unwrap();
    assert!(filter.matches_name("main.rs"));
    assert!(filter.matches_name("rsync.conf"));
    assert!(!filter.matches_name("MAIN.RS"));
}

#[test]
fn default_exclude_hides_dotfiles() {
    let syntax = PatternSyntax::Regex;
    let filter = PatternFilter::new(
        syntax.default_include(),
        Some(syntax.default_exclude()),
        syntax,
    )
    .unwrap();

    assert!(filter.matches_name("notes.txt"));
    assert!(!filter.matches_name(".notes.txt.swp"));
    assert!(filter.excludes_name(".git"));
}

#[test]
fn exclude_wins_over_include() {
    let filter = PatternFilter::new(r"\.txt$", Some("^draft"), PatternSyntax::Regex).unwrap();
    assert!(filter.matches_name("final.txt"));
    assert!(!filter.matches_name("draft.txt"));
    assert!(!filter.matches_name("final.md"));
}

#[test]
fn only_the_base_name_is_matched() {
    // The directory part would match `^src`, the file name does not.
    let filter = PatternFilter::new("^src", None, PatternSyntax::Regex).unwrap();
    assert!(!filter.matches_path(Path::new("/project/src/lib.rs")));
    assert!(filter.matches_path(Path::new("/project/src")));

    let hidden_dir = PatternFilter::new(".*", Some(r"^\."), PatternSyntax::Regex).unwrap();
    assert!(hidden_dir.matches_path(Path::new("/project/.cache/data.bin")));
}

#[test]
fn glob_matches_whole_name() {
    let filter = PatternFilter::new("*.md", Some("*.tmp"), PatternSyntax::Glob).unwrap();
    assert!(filter.matches_name("README.md"));
    assert!(!filter.matches_name("README.md.tmp"));
    assert!(!filter.matches_name("README.markdown"));
}

#[test]
fn invalid_patterns_are_reported() {
    let err = PatternFilter::new("[", None, PatternSyntax::Regex).unwrap_err();
    assert!(matches!(err, WatchcmdError::InvalidPattern(_)));

    let err = PatternFilter::new("*.rs", Some("[z-a]"), PatternSyntax::Glob).unwrap_err();
    assert!(matches!(err, WatchcmdError::InvalidPattern(_)));
}
