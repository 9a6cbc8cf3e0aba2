use crate::fetch::PageFetcher;
use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use std::ops::Deref;
use wrdict_model::{EntryRow, LangPair};

pub const BASE_URL: &str = "https://www.wordreference.com";

/// Translation rows per result page; later pages are requested with `?start=N`.
pub const PAGE_SIZE: usize = 100;

/// Look up one term, following result pages until they run out.
///
/// Returns one row per translation found, or a single placeholder row when
/// the term has no entries. Fetch errors propagate so the caller can retry
/// the term later.
pub async fn lookup<F: PageFetcher>(
    fetcher: &F,
    base: &Url,
    pair: &LangPair,
    term: &str,
    max_pages: usize,
) -> Result<Vec<EntryRow>> {
    let url = term_url(base, pair, term)?;
    let pair_path = pair.path();

    let Some(html) = fetcher
        .fetch(&url)
        .await
        .with_context(|| format!("Failed to fetch '{term}'"))?
    else {
        tracing::debug!(term, "No dictionary page");
        return Ok(vec![EntryRow::empty(term)]);
    };

    let header = parse_header(&html, base);
    let mut parsed = parse_page(&html, &pair_path);
    let mut assembler = EntryAssembler::default();
    let mut pages = 1;

    while parsed.tables > 0 && assembler.has_new_ids(&parsed.rows) {
        assembler.feed(std::mem::take(&mut parsed.rows));

        if pages >= max_pages {
            tracing::warn!(term, pages, "Stopped at page limit");
            break;
        }

        let next = page_url(&url, pages);
        match fetcher
            .fetch(&next)
            .await
            .with_context(|| format!("Failed to fetch page {pages} of '{term}'"))?
        {
            Some(html) => parsed = parse_page(&html, &pair_path),
            None => break,
        }
        pages += 1;
    }

    let rows = assembler.finish(term, &header);
    tracing::trace!(term, pages, rows = rows.len(), "Assembled entries");
    Ok(rows)
}

/// `{base}/{from}{to}/{term}`, with the term as one percent-encoded segment.
pub fn term_url(base: &Url, pair: &LangPair, term: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("Base URL cannot take a path: {base}"))?
        .pop_if_empty()
        .push(&pair.path())
        .push(term);
    Ok(url)
}

/// URL of result page `page` (0-based) for a term URL.
pub fn page_url(term_url: &Url, page: usize) -> Url {
    let mut url = term_url.clone();
    if page > 0 {
        url.set_query(Some(&format!("start={}", page * PAGE_SIZE)));
    }
    url
}

/// Per-term data found once, at the top of the first page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageHeader {
    pub pronunciations: Vec<String>,
    pub audios: Vec<String>,
}

/// A row of a `table.WRD` result table.
#[derive(Debug, Clone, PartialEq)]
pub enum PageRow {
    Translation(TranslationRow),
    Example {
        from: Option<String>,
        to: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRow {
    /// Row id, e.g. "enfr:12345". Consecutive rows sharing it are one sense.
    pub id: String,
    pub altterm: Option<String>,
    pub pos: Option<String>,
    pub definition: Option<String>,
    pub sense: Option<String>,
}

#[derive(Debug, Default)]
pub struct ParsedPage {
    /// Number of `table.WRD` tables; zero means past the last result page.
    pub tables: usize,
    pub rows: Vec<PageRow>,
}

pub fn parse_header(html: &str, base: &Url) -> PageHeader {
    let document = Html::parse_document(html);
    let wrapper_sel = Selector::parse("div.pwrapper").expect("valid selector");
    let pron_sel = Selector::parse("span.pronWR, span.pronRH").expect("valid selector");
    let audio_sel = Selector::parse("div#listen_widget audio source[src]").expect("valid selector");

    let pronunciations = document
        .select(&wrapper_sel)
        .next()
        .map(|wrapper| {
            wrapper
                .select(&pron_sel)
                .map(|span| {
                    let mut text = String::new();
                    text_outside_spans(*span, &mut text);
                    text.trim().to_string()
                })
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let audios = document
        .select(&audio_sel)
        .filter_map(|source| source.value().attr("src"))
        .filter_map(|src| base.join(src).ok())
        .map(|url| url.to_string())
        .collect();

    PageHeader { pronunciations, audios }
}

/// Extract the result rows of one page.
///
/// Rows whose id carries the dictionary path (e.g. "enfr:…") are
/// translations; every other even/odd row is an example line.
pub fn parse_page(html: &str, pair_path: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table.WRD").expect("valid selector");
    let row_sel = Selector::parse("tr.even, tr.odd").expect("valid selector");

    let mut page = ParsedPage::default();
    for table in document.select(&table_sel) {
        page.tables += 1;
        for tr in table.select(&row_sel) {
            match tr.value().attr("id") {
                Some(id) if id.contains(pair_path) => {
                    page.rows.push(PageRow::Translation(parse_translation(tr, id)));
                }
                _ => {
                    if let Some(example) = parse_example(tr) {
                        page.rows.push(example);
                    }
                }
            }
        }
    }
    page
}

fn parse_translation(tr: ElementRef, id: &str) -> TranslationRow {
    let fr_sel = Selector::parse("td.FrWrd").expect("valid selector");
    let to_sel = Selector::parse("td.ToWrd").expect("valid selector");
    let td_sel = Selector::parse("td").expect("valid selector");
    let strong_sel = Selector::parse("strong").expect("valid selector");
    let em_sel = Selector::parse("em").expect("valid selector");

    let fr_wrd = tr.select(&fr_sel).next();
    let to_wrd = tr.select(&to_sel).next();

    let altterm = fr_wrd
        .and_then(|td| td.select(&strong_sel).next())
        .and_then(first_text);
    let pos = fr_wrd
        .and_then(|td| td.select(&em_sel).next())
        .and_then(|em| direct_texts(em).next())
        .map(String::from);
    let definition = to_wrd.and_then(|td| direct_texts(td).next()).map(String::from);

    // The middle column holds the sense note, e.g. "(greeting)".
    let sense = tr
        .select(&td_sel)
        .filter(|td| !has_class(*td, "FrWrd") && !has_class(*td, "ToWrd"))
        .last()
        .and_then(|td| direct_texts(td).last())
        .map(String::from);

    TranslationRow {
        id: id.to_string(),
        altterm,
        pos,
        definition,
        sense,
    }
}

fn parse_example(tr: ElementRef) -> Option<PageRow> {
    let from_sel = Selector::parse("td.FrEx").expect("valid selector");
    let to_sel = Selector::parse("td.ToEx").expect("valid selector");

    let from = tr.select(&from_sel).next().and_then(first_text);
    let to = tr.select(&to_sel).next().and_then(first_text);
    if from.is_none() && to.is_none() {
        return None;
    }
    Some(PageRow::Example { from, to })
}

/// Builds entry rows from translation and example rows, across pages.
#[derive(Debug, Default)]
pub struct EntryAssembler {
    groups: Vec<SenseGroup>,
    seen_ids: HashSet<String>,
}

#[derive(Debug)]
struct SenseGroup {
    id: String,
    translations: Vec<TranslationRow>,
    examples: Vec<String>,
}

impl EntryAssembler {
    /// Whether `rows` holds any translation the assembler has not seen.
    ///
    /// A page of only known ids means the service is repeating itself.
    pub fn has_new_ids(&self, rows: &[PageRow]) -> bool {
        rows.iter().any(|row| match row {
            PageRow::Translation(t) => !self.seen_ids.contains(&t.id),
            PageRow::Example { .. } => false,
        })
    }

    pub fn feed(&mut self, rows: Vec<PageRow>) {
        for row in rows {
            match row {
                PageRow::Translation(t) => match self.groups.last_mut() {
                    Some(group) if group.id == t.id => group.translations.push(t),
                    _ => {
                        self.seen_ids.insert(t.id.clone());
                        self.groups.push(SenseGroup {
                            id: t.id.clone(),
                            translations: vec![t],
                            examples: Vec::new(),
                        });
                    }
                },
                PageRow::Example { from, to } => {
                    // Examples before the first translation have no owner.
                    let Some(group) = self.groups.last_mut() else {
                        continue;
                    };
                    let sense = group.translations.last().and_then(|t| t.sense.clone());
                    if let Some(from) = from {
                        group.examples.push(match sense {
                            Some(sense) => format!("{from} {sense}"),
                            None => from,
                        });
                    }
                    if let Some(to) = to {
                        group.examples.push(to);
                    }
                }
            }
        }
    }

    /// One row per translation, each carrying its sense group's examples.
    pub fn finish(self, term: &str, header: &PageHeader) -> Vec<EntryRow> {
        let rows: Vec<EntryRow> = self
            .groups
            .into_iter()
            .flat_map(|group| {
                let examples = group.examples;
                group
                    .translations
                    .into_iter()
                    .filter(|t| t.altterm.is_some() || t.definition.is_some())
                    .map(move |t| EntryRow {
                        term: term.to_string(),
                        altterm: t.altterm,
                        pronunciations: header.pronunciations.clone(),
                        definition: t.definition,
                        pos: t.pos,
                        sense: t.sense,
                        examples: examples.clone(),
                        audios: header.audios.clone(),
                    })
            })
            .collect();

        if rows.is_empty() {
            vec![EntryRow::empty(term)]
        } else {
            rows
        }
    }
}

/// Text of a node, skipping nested `<span>` tooltips.
fn text_outside_spans(node: ego_tree::NodeRef<Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text.deref()),
            Node::Element(elem) if elem.name() == "span" => {}
            Node::Element(_) => text_outside_spans(child, out),
            _ => {}
        }
    }
}

/// Non-blank text nodes that are direct children of `el`, trimmed.
fn direct_texts<'a>(el: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    el.children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
}

/// First non-blank text anywhere under `el`, trimmed.
fn first_text(el: ElementRef) -> Option<String> {
    el.text()
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(String::from)
}

fn has_class(el: ElementRef, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_PAGE: &str = r#"
    <html><body>
    <div class="pwrapper">
      <div id="pronunciation_widget">
        <span class="pronWR">/həˈləʊ/<span class="tooltip">UK pronunciation</span></span>
        <span class="pronRH">(hə lō′)</span>
      </div>
    </div>
    <div id="listen_widget">
      <audio><source src="/audio/en/uk/general/en045123.mp3" type="audio/mpeg"></audio>
      <audio><source src="/audio/en/us/us/en045123.mp3" type="audio/mpeg"></audio>
    </div>
    <table class="WRD">
      <tr class="wrtopsection"><td colspan="3">Principal Translations</td></tr>
      <tr class="langHeader"><td>English</td><td></td><td>French</td></tr>
      <tr class="even" id="enfr:4411">
        <td class="FrWrd"><strong>hello</strong> <em class="tooltip POS2">interj<span><i>interjection</i>: Exclamation</span></em></td>
        <td> (greeting) </td>
        <td class="ToWrd">bonjour <em class="tooltip POS2">interj<span>interjection</span></em></td>
      </tr>
      <tr class="even" id="enfr:4411">
        <td class="FrWrd"></td>
        <td> </td>
        <td class="ToWrd">salut <em class="tooltip POS2">interj</em></td>
      </tr>
      <tr class="even">
        <td>&nbsp;</td><td colspan="2" class="FrEx"><span dir="ltr">Hello, how are you?</span></td>
      </tr>
      <tr class="even">
        <td>&nbsp;</td><td colspan="2" class="ToEx"><span dir="ltr">Bonjour, comment allez-vous ?</span></td>
      </tr>
      <tr class="odd" id="enfr:4412">
        <td class="FrWrd"><strong>hello</strong> <em class="tooltip POS2">n<span>noun</span></em></td>
        <td>(greeting word)</td>
        <td class="ToWrd">bonjour <em class="tooltip POS2">nm</em></td>
      </tr>
    </table>
    </body></html>
    "#;

    fn base() -> Url {
        Url::parse(BASE_URL).unwrap()
    }

    #[test]
    fn test_term_url() {
        let pair = LangPair::new("en", "fr").unwrap();
        let url = term_url(&base(), &pair, "ice cream").unwrap();
        assert_eq!(url.as_str(), "https://www.wordreference.com/enfr/ice%20cream");

        let url = term_url(&base(), &pair, "and/or").unwrap();
        assert_eq!(url.as_str(), "https://www.wordreference.com/enfr/and%2For");
    }

    #[test]
    fn test_page_url() {
        let pair = LangPair::new("es", "en").unwrap();
        let url = term_url(&base(), &pair, "hola").unwrap();
        assert_eq!(page_url(&url, 0).as_str(), "https://www.wordreference.com/esen/hola");
        assert_eq!(page_url(&url, 2).as_str(), "https://www.wordreference.com/esen/hola?start=200");
    }

    #[test]
    fn test_parse_header() {
        let header = parse_header(HELLO_PAGE, &base());
        assert_eq!(header.pronunciations, vec!["/həˈləʊ/", "(hə lō′)"]);
        assert_eq!(
            header.audios,
            vec![
                "https://www.wordreference.com/audio/en/uk/general/en045123.mp3",
                "https://www.wordreference.com/audio/en/us/us/en045123.mp3",
            ]
        );
    }

    #[test]
    fn test_parse_page_rows() {
        let page = parse_page(HELLO_PAGE, "enfr");
        assert_eq!(page.tables, 1);
        assert_eq!(page.rows.len(), 5);

        let PageRow::Translation(first) = &page.rows[0] else {
            panic!("expected a translation row, got {:?}", page.rows[0]);
        };
        assert_eq!(first.id, "enfr:4411");
        assert_eq!(first.altterm.as_deref(), Some("hello"));
        assert_eq!(first.pos.as_deref(), Some("interj"));
        assert_eq!(first.definition.as_deref(), Some("bonjour"));
        assert_eq!(first.sense.as_deref(), Some("(greeting)"));

        let PageRow::Translation(second) = &page.rows[1] else {
            panic!("expected a translation row");
        };
        assert_eq!(second.altterm, None);
        assert_eq!(second.definition.as_deref(), Some("salut"));
        assert_eq!(second.sense, None);

        assert_eq!(
            page.rows[2],
            PageRow::Example {
                from: Some("Hello, how are you?".into()),
                to: None,
            }
        );
    }

    #[test]
    fn test_page_without_tables() {
        let page = parse_page("<html><body><p>No translation found</p></body></html>", "enfr");
        assert_eq!(page.tables, 0);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn test_rows_of_other_dictionaries_are_not_translations() {
        let html = r#"<table class="WRD">
            <tr class="even" id="fren:99"><td class="FrWrd"><strong>salut</strong></td><td></td><td class="ToWrd">hi</td></tr>
        </table>"#;
        let page = parse_page(html, "enfr");
        assert!(page.rows.is_empty());
    }

    #[test]
    fn test_assemble_entries() {
        let header = parse_header(HELLO_PAGE, &base());
        let page = parse_page(HELLO_PAGE, "enfr");

        let mut assembler = EntryAssembler::default();
        assert!(assembler.has_new_ids(&page.rows));
        assembler.feed(page.rows.clone());
        assert!(!assembler.has_new_ids(&page.rows));

        let rows = assembler.finish("hello", &header);
        assert_eq!(rows.len(), 3);

        // Both translations of the first sense share its examples. The
        // latest translation ("salut") has no sense note to append.
        assert_eq!(rows[0].definition.as_deref(), Some("bonjour"));
        assert_eq!(rows[1].definition.as_deref(), Some("salut"));
        assert_eq!(rows[0].examples, rows[1].examples);
        assert_eq!(
            rows[0].examples,
            vec!["Hello, how are you?", "Bonjour, comment allez-vous ?"]
        );

        assert_eq!(rows[2].pos.as_deref(), Some("n"));
        assert!(rows[2].examples.is_empty());

        for row in &rows {
            assert_eq!(row.term, "hello");
            assert_eq!(row.pronunciations, header.pronunciations);
            assert_eq!(row.audios.len(), 2);
        }
    }

    #[test]
    fn test_sense_is_appended_to_source_example() {
        let html = r#"<table class="WRD">
            <tr class="odd" id="enfr:1"><td class="FrWrd"><strong>run</strong> <em>vi</em></td><td>(move fast)</td><td class="ToWrd">courir</td></tr>
            <tr class="odd"><td></td><td class="FrEx">He runs every day.</td></tr>
        </table>"#;
        let mut assembler = EntryAssembler::default();
        assembler.feed(parse_page(html, "enfr").rows);
        let rows = assembler.finish("run", &PageHeader::default());
        assert_eq!(rows[0].examples, vec!["He runs every day. (move fast)"]);
    }

    #[test]
    fn test_empty_assembly_yields_placeholder() {
        let assembler = EntryAssembler::default();
        let rows = assembler.finish("zzyzx", &PageHeader::default());
        assert_eq!(rows, vec![EntryRow::empty("zzyzx")]);
    }

    #[test]
    fn test_orphan_examples_are_dropped() {
        let mut assembler = EntryAssembler::default();
        assembler.feed(vec![PageRow::Example {
            from: Some("Orphan.".into()),
            to: None,
        }]);
        assert_eq!(assembler.finish("x", &PageHeader::default()), vec![EntryRow::empty("x")]);
    }
}
