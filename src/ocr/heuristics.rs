//! Content structure heuristics for OCR and model output.
//!
//! Decides whether a line (or a whole text) looks like source code. Used to
//! recover code from unfenced text and as a logging signal after OCR.

const KEYWORDS: &[&str] = &[
    "import", "from", "const", "let", "var", "function", "def", "class", "if", "for", "while",
    "return", "func", "fn", "pub", "public", "private", "protected", "static", "void", "int",
    "long", "bool", "else", "elif", "try", "except", "catch", "struct", "impl", "package",
    "#include", "using", "switch", "case", "async", "await", "lambda", "template", "typedef",
];

/// Lines starting with these are problem-statement labels, not code.
const LABELS: &[&str] = &[
    "input", "output", "example", "explanation", "constraint", "note", "follow", "title",
    "problem", "question", "description", "time complexity", "space complexity",
];

const CODE_SYMBOLS: &str = "(){}[];=<>+-*/%&|!:";

fn starts_with_keyword(trimmed: &str) -> bool {
    KEYWORDS.iter().any(|kw| {
        trimmed
            .strip_prefix(kw)
            .map(|rest| rest.starts_with(' ') || rest.starts_with('(') || rest.starts_with('<'))
            .unwrap_or(false)
    })
}

fn is_label(trimmed: &str) -> bool {
    let lower = trimmed.trim_start_matches(&['*', '#', ' '][..]).to_lowercase();
    LABELS.iter().any(|label| lower.starts_with(label))
}

fn is_bullet(trimmed: &str) -> bool {
    if trimmed.starts_with("- ") || trimmed.starts_with("* ") || trimmed.starts_with("• ") {
        return true;
    }
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && matches!(trimmed[digits..].chars().next(), Some('.') | Some(')'))
        && trimmed[digits + 1..].starts_with(' ')
}

/// Returns true if a single line looks like a line of source code.
pub fn is_code_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || is_label(trimmed) || is_bullet(trimmed) {
        return false;
    }

    if starts_with_keyword(trimmed) {
        return true;
    }
    if ['{', '}', ';'].iter().any(|c| trimmed.ends_with(*c)) {
        return true;
    }
    if trimmed.starts_with("//") || trimmed.starts_with("/*") {
        return true;
    }

    // Symbol-dense lines: assignments, calls, indexing.
    let non_ws: Vec<char> = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    let symbols = non_ws.iter().filter(|c| CODE_SYMBOLS.contains(**c)).count();
    let has_anchor = trimmed.contains('=') || trimmed.contains('(') || trimmed.contains('{');
    let dense = non_ws.len() >= 3 && symbols as f64 / non_ws.len() as f64 >= 0.2;
    let indented = line.starts_with("    ") || line.starts_with('\t');

    has_anchor && (dense || indented)
}

/// Contiguous runs of code-like lines, original indentation kept.
///
/// A blank line does not break a run when the next non-blank line is code.
pub fn code_runs(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut runs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if is_code_line(line) {
            current.push(line);
        } else if line.trim().is_empty() && !current.is_empty() {
            let next_code = lines[i + 1..]
                .iter()
                .find(|l| !l.trim().is_empty())
                .map(|l| is_code_line(l))
                .unwrap_or(false);
            if next_code {
                current.push(line);
            } else {
                runs.push(current.join("\n"));
                current.clear();
            }
        } else if !current.is_empty() {
            runs.push(current.join("\n"));
            current.clear();
        }
        i += 1;
    }
    if !current.is_empty() {
        runs.push(current.join("\n"));
    }
    runs
}

/// Returns true if the text appears to contain source code.
///
/// Looks for keyword lines, bracket/semicolon endings, indentation and
/// comment markers. Requires at least 2 indicators to match.
pub fn detect_code_structure(text: &str) -> bool {
    let indicators: Vec<&dyn Fn(&str) -> bool> = vec![
        // Language keywords at line start
        &|t: &str| t.lines().any(|l| starts_with_keyword(l.trim())),
        // Lines ending with brackets/semicolons
        &|t: &str| {
            t.lines().any(|l| {
                let trimmed = l.trim();
                ['{', '}', ')', ';', ':'].iter().any(|c| trimmed.ends_with(*c))
            })
        },
        // Indented blocks
        &|t: &str| {
            t.lines()
                .filter(|l| l.starts_with("  ") || l.starts_with('\t'))
                .count()
                > 1
        },
        // Comments
        &|t: &str| {
            t.lines().any(|l| {
                let trimmed = l.trim();
                trimmed.starts_with("//") || trimmed.starts_with('#') || trimmed.starts_with("/*")
            })
        },
        // Any symbol-dense line at all
        &|t: &str| t.lines().any(is_code_line),
    ];

    indicators.iter().filter(|check| check(text)).count() >= 2
}
