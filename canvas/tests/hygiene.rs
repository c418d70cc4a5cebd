//! Source checks for the code that ships in the browser build.
//!
//! Scans the non-test sources of `canvas` and of `protocol`, which is compiled
//! into the same wasm module. A panic there takes the whole canvas down, so
//! none of the rules has an allowance. Every hit is reported as `file:line`.

use std::fs;
use std::path::{Path, PathBuf};

/// Substrings that must not appear in shipped code.
const FORBIDDEN: &[(&str, &str)] = &[
    (".unwrap()", "propagate or handle the error"),
    (".expect(", "propagate or handle the error"),
    ("panic!(", "return an error instead"),
    ("unreachable!(", "make the match exhaustive instead"),
    ("todo!(", "finish the code path"),
    ("unimplemented!(", "finish the code path"),
    ("let _ =", "inspect or log the discarded result"),
    (".ok()", "inspect or log the discarded error"),
    ("#[allow(dead_code)]", "delete the unused item"),
];

const NUMERIC_TYPES: &[&str] =
    &["f32", "f64", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize"];

/// How far above a cast the acknowledging `#[allow(clippy::cast_*)]` may sit.
const CAST_ALLOW_REACH: usize = 6;

/// Files allowed to name browser bindings. Everything else must build and run
/// natively so the engine stays testable without a browser.
const BROWSER_EDGE: &[&str] = &["engine.rs", "render.rs", "web.rs"];
const BROWSER_CRATES: &[&str] = &["web_sys::", "wasm_bindgen", "gloo_net::", "js_sys::"];

struct Source {
    path: PathBuf,
    lines: Vec<String>,
}

impl Source {
    /// Non-comment lines with their 1-based line numbers.
    fn code(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| (i + 1, line.as_str()))
            .filter(|(_, line)| !line.trim_start().starts_with("//"))
    }

    fn file_name(&self) -> String {
        self.path.file_name().unwrap_or_default().to_string_lossy().into_owned()
    }

    fn at(&self, line: usize) -> String {
        format!("{}:{line}", self.path.display())
    }
}

fn sources() -> Vec<Source> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut out = Vec::new();
    for dir in [root.join("src"), root.join("../protocol/src")] {
        collect(&dir, &mut out);
    }
    assert!(out.len() > 1, "no sources found under {}", root.display());
    out
}

fn collect(dir: &Path, out: &mut Vec<Source>) {
    let entries = fs::read_dir(dir).unwrap_or_else(|e| panic!("reading {}: {e}", dir.display()));
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        if !name.ends_with(".rs") || name.ends_with("_test.rs") {
            continue;
        }
        let content = fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()));
        out.push(Source { path, lines: content.lines().map(str::to_owned).collect() });
    }
}

fn report(what: &str, hits: &[String]) {
    assert!(hits.is_empty(), "{what}:\n  {}", hits.join("\n  "));
}

/// The type named by a numeric `as` cast on this line, if any.
fn numeric_cast(line: &str) -> Option<&'static str> {
    line.match_indices(" as ").find_map(|(at, _)| {
        let rest = &line[at + 4..];
        let end = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(rest.len());
        NUMERIC_TYPES.iter().copied().find(|ty| *ty == &rest[..end])
    })
}

/// Whether the line indexes into a value (`items[i]`, `call()[0]`).
/// Attributes, array types and `vec![` never match.
fn direct_index(line: &str) -> bool {
    line.as_bytes()
        .windows(2)
        .any(|pair| (pair[0].is_ascii_alphanumeric() || pair[0] == b'_' || pair[0] == b')') && pair[1] == b'[')
}

#[test]
fn scans_canvas_and_protocol() {
    let files: Vec<String> = sources().iter().map(|s| s.path.display().to_string()).collect();
    assert!(files.iter().any(|f| f.ends_with("engine.rs")), "{files:?}");
    assert!(files.iter().any(|f| f.contains("protocol") && f.ends_with("lib.rs")), "{files:?}");
    assert!(!files.iter().any(|f| f.ends_with("_test.rs")), "{files:?}");
}

#[test]
fn no_panicking_or_swallowing_constructs() {
    let sources = sources();
    let hits: Vec<String> = FORBIDDEN
        .iter()
        .flat_map(|(needle, fix)| {
            sources.iter().flat_map(move |source| {
                source
                    .code()
                    .filter(move |(_, line)| line.contains(needle))
                    .map(move |(n, _)| format!("{} `{needle}`: {fix}", source.at(n)))
            })
        })
        .collect();
    report("forbidden constructs", &hits);
}

#[test]
fn numeric_casts_are_acknowledged() {
    let mut hits = Vec::new();
    for source in sources() {
        for (n, line) in source.code() {
            let Some(ty) = numeric_cast(line) else {
                continue;
            };
            let from = n.saturating_sub(CAST_ALLOW_REACH + 1);
            let acknowledged = source.lines[from..n].iter().any(|l| l.contains("#[allow(clippy::cast_"));
            if !acknowledged {
                hits.push(format!("{} cast to {ty}: use From/TryFrom or allow the specific cast lint", source.at(n)));
            }
        }
    }
    report("unacknowledged numeric casts", &hits);
}

#[test]
fn no_direct_indexing() {
    let mut hits = Vec::new();
    for source in sources() {
        for (n, line) in source.code() {
            if direct_index(line) {
                hits.push(format!("{} `{}`: use get() or iterators", source.at(n), line.trim()));
            }
        }
    }
    report("direct indexing", &hits);
}

#[test]
fn browser_bindings_stay_at_the_edge() {
    let mut hits = Vec::new();
    for source in sources() {
        if BROWSER_EDGE.contains(&source.file_name().as_str()) {
            continue;
        }
        for (n, line) in source.code() {
            if let Some(krate) = BROWSER_CRATES.iter().find(|krate| line.contains(*krate)) {
                hits.push(format!("{} names {krate}", source.at(n)));
            }
        }
    }
    report("browser bindings outside the edge modules", &hits);
}

#[test]
fn detectors_recognize_their_patterns() {
    assert_eq!(numeric_cast("let w = x.round() as u32;"), Some("u32"));
    assert_eq!(numeric_cast("use foo::Bar as Baz;"), None);
    assert_eq!(numeric_cast("v as usizes"), None);
    assert!(direct_index("let a = items[0];"));
    assert!(direct_index("call()[1..]"));
    assert!(!direct_index("#[derive(Debug)]"));
    assert!(!direct_index("let v: [f64; 2] = vec![1.0, 2.0];"));
}
