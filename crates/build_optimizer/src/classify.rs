use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CORE_FILE_REGEX: Regex =
        Regex::new(r"[\\/]node_modules[\\/]@angular[\\/]core[\\/]").unwrap();
    static ref SIDE_EFFECT_FREE_MODULE_REGEX: Regex = Regex::new(
        r"[\\/]node_modules[\\/](?:@angular[\\/](?:animations|common|compiler|core|forms|http|platform-browser|platform-browser-dynamic|platform-server|platform-webworker|platform-webworker-dynamic|router|upgrade|material|cdk)|rxjs)[\\/]"
    )
    .unwrap();
    static ref RXJS_ADD_REGEX: Regex = Regex::new(r"[\\/]node_modules[\\/]rxjs[\\/]add[\\/]").unwrap();
}

const FACTORY_SUFFIXES: [&str; 2] = [".ngfactory.js", ".ngstyle.js"];

/// Files belonging to the framework core package itself.
pub fn is_known_core_file(path: &str) -> bool {
    CORE_FILE_REGEX.is_match(path)
}

/// Files whose top-level calls can be assumed pure.
pub fn is_known_side_effect_free(path: &str) -> bool {
    if FACTORY_SUFFIXES.iter().any(|suffix| path.ends_with(suffix)) {
        return true;
    }
    SIDE_EFFECT_FREE_MODULE_REGEX.is_match(path) && !RXJS_ADD_REGEX.is_match(path)
}
