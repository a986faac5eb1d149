use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Clave de ordenamiento insensible a mayúsculas y tildes.
///
/// Descompone la cadena (NFD), descarta las marcas combinantes y pasa a
/// minúsculas, de modo que "Ñandú" y "nandu" comparen como equivalentes.
pub fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Comparación de cadenas al estilo `localeCompare` del origen.
pub fn compare(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}
