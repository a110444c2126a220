//! Output filename derivation.
//!
//! The two output formats name their files differently, matching what the
//! publishing site and the Paprika importer each expect:
//!
//! - Markdown documents use a URL-safe slug: `Mac & Cheese (Baked)` →
//!   `mac-and-cheese-baked.md`.
//! - Archives keep the recipe name as typed, reduced to a single path
//!   component: `Mac & Cheese (Baked)` → `Mac & Cheese (Baked).paprikarecipe`.
//!
//! Neither is guaranteed unique. Two recipes that slugify alike write to the
//! same file and the last one wins; the export stage warns when it sees this
//! happen within a run.

/// Lowercase, strict, hyphenated slug of a recipe name.
///
/// `&` reads as "and", common Latin accents fold to ASCII, and anything that
/// is not an ASCII letter, digit or whitespace is dropped. Runs of whitespace
/// and hyphens collapse into a single `-`.
///
/// - `"Mac & Cheese"` → `"mac-and-cheese"`
/// - `"Crème Brûlée"` → `"creme-brulee"`
/// - `"Grandma's Pie -- v2"` → `"grandmas-pie-v2"`
pub fn slugify(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '&' => folded.push_str("and"),
            '-' => folded.push(' '),
            c if c.is_ascii_alphanumeric() || c.is_whitespace() => folded.push(c),
            c => {
                if let Some(ascii) = fold_latin(c) {
                    folded.push_str(ascii);
                }
            }
        }
    }

    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Last `/`-separated component of a path or URL, ignoring trailing slashes.
///
/// - `"https://host/photos/ABC.jpg"` → `"ABC.jpg"`
/// - `"1/2 Cup Cookies"` → `"2 Cup Cookies"`
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Filename stem for a recipe's archive: the basename of the raw name with
/// NUL bytes removed. Returns `None` when nothing usable is left.
pub fn archive_file_stem(name: &str) -> Option<String> {
    let stem: String = basename(name).chars().filter(|&c| c != '\0').collect();
    if stem.trim().is_empty() { None } else { Some(stem) }
}

fn fold_latin(c: char) -> Option<&'static str> {
    let ascii = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'Æ' | 'æ' => "ae",
        'Ç' | 'ç' => "c",
        'È' | 'É' | 'Ê' | 'Ë' | 'è' | 'é' | 'ê' | 'ë' => "e",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'ì' | 'í' | 'î' | 'ï' => "i",
        'Ð' | 'ð' => "d",
        'Ñ' | 'ñ' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'Œ' | 'œ' => "oe",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'ù' | 'ú' | 'û' | 'ü' => "u",
        'Ý' | 'ý' | 'ÿ' => "y",
        'Þ' | 'þ' => "th",
        'ß' => "ss",
        _ => return None,
    };
    Some(ascii)
}
