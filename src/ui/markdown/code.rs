use pulldown_cmark::CodeBlockKind;

pub(super) fn language_hint_from_codeblock_kind(kind: &CodeBlockKind<'_>) -> Option<String> {
    match kind {
        CodeBlockKind::Indented => None,
        CodeBlockKind::Fenced(info) => Some(info.split_ascii_whitespace().next().unwrap_or("").into()),
    }
}

pub(super) fn detab(s: &str) -> String {
    s.replace('\t', "    ")
}
