use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::value::scalar_to_string;
use crate::{Arg, MethodMetadata};

static ABSOLUTE_URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    RegexBuilder::new(r"^[a-z][a-z\d+\-.]*://")
        .case_insensitive(true)
        .build()
        .ok()
});

fn is_absolute(path: &str) -> bool {
    ABSOLUTE_URL
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(path))
}

/// Resolve the request URL of a call.
///
/// An absolute path template is used unchanged, ignoring endpoint and base
/// path. Otherwise the URL is `endpoint + base_path + path`, without the base
/// path when the method opts out of it. Each bound `{name}` token is then
/// replaced, in declaration order, by the argument value; a token whose
/// argument is null or missing is left as-is.
#[must_use]
pub fn resolve_url(metadata: &MethodMetadata, endpoint: &str, base_path: &str, args: &[Arg]) -> String {
    let mut url = if is_absolute(&metadata.path) {
        metadata.path.clone()
    } else if metadata.ignore_base_path {
        format!("{endpoint}{}", metadata.path)
    } else {
        format!("{endpoint}{base_path}{}", metadata.path)
    };

    for (&index, name) in &metadata.path_params {
        let Some(value) = Arg::at(args, index).as_value().and_then(scalar_to_string) else {
            continue;
        };
        let token = format!("{{{name}}}");
        url = url.replacen(&token, &value, 1);
    }

    url
}
