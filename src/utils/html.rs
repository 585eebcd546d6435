/// Sanitises rich course text with ammonia's whitelist.
///
/// Safe formatting tags survive; `<script>`, `<iframe>`, event handler attributes
/// and similar are stripped before the text is stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
