/// Extracts class names referenced by a field descriptor or generic
/// signature string.
///
/// Every maximal substring between an `L` and the next `<` or `;` is an
/// internal (slash-separated) class name, which we hand back dotted.
/// Array-dimension prefixes (`[`) and primitive single-character codes
/// (`B C D F I J S Z V`) are skipped implicitly: they never start an `L`
/// run, so the scan just moves past them one byte at a time. Applying the
/// same rule to a generic signature yields each type argument too, because
/// we keep scanning past a `<` instead of stopping there.
pub fn extract_class_names(descriptor_or_signature: &str) -> Vec<String> {
    let bytes = descriptor_or_signature.as_bytes();
    let mut names = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'L' {
            let start = i + 1;
            let mut j = start;
            while j < bytes.len() && bytes[j] != b'<' && bytes[j] != b';' {
                j += 1;
            }
            if j > start {
                let internal = &descriptor_or_signature[start..j];
                names.push(internal.replace('/', "."));
            }
            i = if j < bytes.len() && bytes[j] == b';' {
                j + 1
            } else {
                // stopped at '<' (or end of string): keep scanning so type
                // arguments nested inside the generic are found too.
                j + 1
            };
        } else {
            i += 1;
        }
    }
    names
}
