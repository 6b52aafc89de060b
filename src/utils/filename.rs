//! File naming for downloaded assets.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\-.() ]").unwrap());

/// Local file name for an asset URL.
///
/// Uses the last path segment without query string, replaces characters
/// outside `[\w\-.() ]` with `_`, and falls back to a timestamped name
/// when nothing usable is left.
pub fn asset_file_name(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    let path = path.split('#').next().unwrap_or(path);
    let segment = path.rsplit('/').next().unwrap_or("");
    let name = UNSAFE_CHARS.replace_all(segment, "_");
    let name = name.trim();

    if name.is_empty() || name == "." || name == ".." {
        format!("img_{}.jpg", chrono::Utc::now().timestamp_millis())
    } else {
        name.to_string()
    }
}

/// Distinct local names for a batch of asset URLs, in input order.
///
/// Names are built with [`asset_file_name`]; a name already taken in the
/// batch gets a `-<n>` suffix before its extension.
pub fn unique_file_names<'a, I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken = HashSet::new();
    urls.into_iter()
        .map(|url| {
            let name = asset_file_name(url);
            if taken.insert(name.clone()) {
                return name;
            }
            let (stem, ext) = split_extension(&name);
            let mut n = 1;
            loop {
                let candidate = format!("{}-{}{}", stem, n, ext);
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    }
}
