use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::{DirEntry, WalkDir};

// Directories never scanned: build output and vendored reference material.
const SKIPPED_DIRS: [&str; 2] = ["./target", "./examples"];

// Collects every matching line of one file to build a single error message.
struct ViolationCollector {
    violations: Vec<String>,
    file_path: PathBuf,
    // Skip lines that are comments or where the match sits inside a string literal.
    skip_comments_and_strings: bool,
}

impl ViolationCollector {
    fn new(file_path: &Path, skip_comments_and_strings: bool) -> Self {
        Self {
            violations: Vec::new(),
            file_path: file_path.to_path_buf(),
            skip_comments_and_strings,
        }
    }

    fn check_and_get_error_message(&self, what: &str, remedy: &str) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }

        let file_name = self.file_path.to_str().unwrap_or("?");
        let mut error_msg = format!(
            "\n❌ ERROR: Found {} {} in {}:\n",
            self.violations.len(),
            what,
            file_name
        );

        for violation in &self.violations {
            error_msg.push_str(&format!("   {violation}\n"));
        }

        error_msg.push_str(&format!(
            "\n⚠️ {what} are STRICTLY FORBIDDEN in this project.\n"
        ));
        error_msg.push_str(&format!("   {remedy}\n"));

        Some(error_msg)
    }
}

impl Sink for ViolationCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();

        if self.skip_comments_and_strings {
            if line_text.trim_start().starts_with("//") {
                return Ok(true);
            }
            // Odd-indexed segments between double quotes are string contents.
            let in_string = line_text
                .split('"')
                .enumerate()
                .any(|(i, part)| i % 2 == 1 && part.contains('_'));
            if in_string {
                return Ok(true);
            }
        }

        self.violations.push(format!("{line_number}:{line_text}"));
        Ok(true)
    }
}

fn is_scanned(entry: &DirEntry) -> bool {
    !SKIPPED_DIRS.iter().any(|dir| entry.path().starts_with(dir))
}

fn rust_sources(exclude_build_script: bool) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(".")
        .into_iter()
        .filter_entry(is_scanned)
        .filter_map(|e| e.ok())
        .filter(move |e| !(exclude_build_script && e.file_name() == "build.rs"))
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.path().to_path_buf())
}

fn scan(
    pattern: &str,
    exclude_build_script: bool,
    skip_comments_and_strings: bool,
    what: &str,
    remedy: &str,
) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(pattern)?;
    let mut searcher = Searcher::new();

    for path in rust_sources(exclude_build_script) {
        let mut collector = ViolationCollector::new(&path, skip_comments_and_strings);
        searcher.search_path(&matcher, &path, &mut collector)?;

        if let Some(error_message) = collector.check_and_get_error_message(what, remedy) {
            return Err(error_message.into());
        }
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=COCHLEA_BUILD_TIMESTAMP={timestamp}");

    let checks = [
        (
            r"\b(_[a-zA-Z0-9_]+)\b",
            false,
            true,
            "Underscore-prefixed variable names",
            "Either use the variable (removing the underscore) or remove it completely.",
        ),
        (
            r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]",
            true,
            false,
            "#[allow(dead_code)] attributes",
            "Either use the code (removing the attribute) or remove it completely.",
        ),
    ];

    for (pattern, exclude_build_script, skip_comments_and_strings, what, remedy) in checks {
        if let Err(e) = scan(
            pattern,
            exclude_build_script,
            skip_comments_and_strings,
            what,
            remedy,
        ) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
