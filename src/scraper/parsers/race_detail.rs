//! Race detail parser.
//!
//! Race pages carry no stable class or id for the entrant table, so both
//! the race name and the entrant list are found by trying rules in order
//! until one yields something. The entrant rules are loose: any table row
//! shaped like `number | name | jockey` is accepted, so an incidental
//! numeric table elsewhere on the page can show up as entrants.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::race_list::normalize_text;

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static LIST_ITEM_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static DOCUMENT_TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// Race name selectors, highest priority first
static RACE_NAME_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["h1", ".race_title, .race-title, .RaceName", ".title"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// "<num> <name...> <jockey>"
static LIST_ENTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s+(.+?)\s+(\S+)$").unwrap());

/// A single horse in the race, in gate order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorseEntry {
    pub num: u32,
    pub name: String,
    pub jockey: String,
}

/// Parsed race detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceDetail {
    pub race_name: String,
    pub horses: Vec<HorseEntry>,
}

type EntrantRule = fn(&Html) -> Vec<HorseEntry>;

/// Entrant rules, tried in order until one returns entries
const ENTRANT_RULES: [EntrantRule; 2] = [
    RaceDetailParser::entries_from_table,
    RaceDetailParser::entries_from_list,
];

/// Parser for race detail pages
pub struct RaceDetailParser;

impl RaceDetailParser {
    /// Parse a race detail page. `url` is only used as the race name of
    /// last resort when the page has no heading and no title.
    pub fn parse(html: &str, url: &str) -> RaceDetail {
        let document = Html::parse_document(html);

        RaceDetail {
            race_name: Self::race_name(&document).unwrap_or_else(|| url.to_string()),
            horses: Self::entries(&document),
        }
    }

    fn race_name(document: &Html) -> Option<String> {
        RACE_NAME_SELECTORS
            .iter()
            .chain(std::iter::once(&*DOCUMENT_TITLE_SELECTOR))
            .find_map(|selector| {
                document
                    .select(selector)
                    .map(|elem| element_text(&elem))
                    .find(|text| !text.is_empty())
            })
    }

    fn entries(document: &Html) -> Vec<HorseEntry> {
        ENTRANT_RULES
            .iter()
            .map(|rule| rule(document))
            .find(|entries| !entries.is_empty())
            .unwrap_or_default()
    }

    /// Rows with at least three cells, a purely numeric first cell and a
    /// second cell containing something other than digits.
    fn entries_from_table(document: &Html) -> Vec<HorseEntry> {
        document
            .select(&ROW_SELECTOR)
            .filter_map(|row| Self::parse_entry_row(&row))
            .collect()
    }

    fn parse_entry_row(row: &ElementRef) -> Option<HorseEntry> {
        let cells: Vec<String> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| cell.value().name() == "td")
            .map(|cell| element_text(&cell))
            .collect();

        if cells.len() < 3 || !NUMERIC_RE.is_match(&cells[0]) {
            return None;
        }
        if !cells[1]
            .chars()
            .any(|c| !c.is_ascii_digit() && !c.is_whitespace())
        {
            return None;
        }

        Some(HorseEntry {
            num: parse_gate_number(&cells[0])?,
            name: cells[1].clone(),
            jockey: cells[2].clone(),
        })
    }

    fn entries_from_list(document: &Html) -> Vec<HorseEntry> {
        document
            .select(&LIST_ITEM_SELECTOR)
            .filter_map(|item| {
                let text = element_text(&item);
                let caps = LIST_ENTRY_RE.captures(&text)?;
                Some(HorseEntry {
                    num: parse_gate_number(&caps[1])?,
                    name: caps[2].to_string(),
                    jockey: caps[3].to_string(),
                })
            })
            .collect()
    }
}

fn element_text(elem: &ElementRef) -> String {
    normalize_text(&elem.text().collect::<String>())
}

/// Gate numbers start at 1; anything else is not an entrant.
fn parse_gate_number(text: &str) -> Option<u32> {
    text.parse::<u32>().ok().filter(|n| *n >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.jra.go.jp/JRADB/accessD.html?CNAME=pw01dde";

    const TABLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>出馬表 | JRA</title></head>
<body>
<h1>
    東京優駿（日本ダービー）
</h1>
<table class="basic narrow-xy">
  <thead>
    <tr><th>馬番</th><th>馬名</th><th>騎手</th><th>斤量</th></tr>
  </thead>
  <tbody>
    <tr><td>1</td><td>シンエンペラー</td><td>坂井瑠星</td><td>57.0</td></tr>
    <tr><td>2</td><td>ミスタージーティー</td><td>藤岡佑介</td><td>57.0</td></tr>
    <tr><td>2024</td><td>2025</td><td>2026</td></tr>
    <tr><td>合計</td><td>3頭</td><td>-</td></tr>
    <tr><td>3</td><td>ジャスティンミラノ</td><td>戸崎圭太</td><td>57.0</td></tr>
    <tr><td>4</td><td>レガレイラ</td></tr>
  </tbody>
</table>
</body>
</html>"#;

    const LIST_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>安田記念 出走馬</title></head>
<body>
<div class="race_title">安田記念</div>
<ul class="menu"><li>トップ</li><li>2024 JRA</li></ul>
<ul>
  <li>1 ソウルラッシュ 浜中俊</li>
  <li>2  Romantic Warrior   McDonald</li>
  <li>3 ナミュール 武豊</li>
</ul>
</body>
</html>"#;

    #[test]
    fn test_table_entries_in_document_order() {
        let detail = RaceDetailParser::parse(TABLE_HTML, URL);

        assert_eq!(detail.race_name, "東京優駿（日本ダービー）");
        let nums: Vec<u32> = detail.horses.iter().map(|h| h.num).collect();
        assert_eq!(nums, vec![1, 2, 3]);
        assert!(nums.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            detail.horses[0],
            HorseEntry {
                num: 1,
                name: "シンエンペラー".to_string(),
                jockey: "坂井瑠星".to_string(),
            }
        );
        assert_eq!(detail.horses[2].jockey, "戸崎圭太");
    }

    #[test]
    fn test_table_rule_is_permissive() {
        // A decorative numeric table that still has a text second column
        let html = r#"<table>
            <tr><td>1</td><td>天気 晴</td><td>芝 良</td></tr>
            <tr><td>2</td><td>シンエンペラー</td><td>坂井瑠星</td></tr>
        </table>"#;
        let detail = RaceDetailParser::parse(html, URL);
        assert_eq!(detail.horses.len(), 2);
        assert_eq!(detail.horses[0].name, "天気 晴");
    }

    #[test]
    fn test_list_fallback_when_no_table_rows_qualify() {
        let detail = RaceDetailParser::parse(LIST_HTML, URL);

        assert_eq!(detail.race_name, "安田記念");
        assert_eq!(detail.horses.len(), 3);
        assert_eq!(detail.horses[0].num, 1);
        assert_eq!(detail.horses[0].name, "ソウルラッシュ");
        assert_eq!(detail.horses[0].jockey, "浜中俊");
        assert_eq!(detail.horses[1].name, "Romantic Warrior");
        assert_eq!(detail.horses[1].jockey, "McDonald");
        assert_eq!(detail.horses[2].num, 3);
    }

    #[test]
    fn test_list_fallback_not_used_when_table_matches() {
        let html = format!(
            "{}<ul><li>9 ダミー 騎手</li></ul>",
            r#"<table><tr><td>1</td><td>シンエンペラー</td><td>坂井瑠星</td></tr></table>"#
        );
        let detail = RaceDetailParser::parse(&html, URL);
        assert_eq!(detail.horses.len(), 1);
        assert_eq!(detail.horses[0].num, 1);
    }

    #[test]
    fn test_zero_gate_number_rejected() {
        let html = r#"<table><tr><td>0</td><td>シンエンペラー</td><td>坂井瑠星</td></tr></table>"#;
        let detail = RaceDetailParser::parse(html, URL);
        assert!(detail.horses.is_empty());
    }

    #[test]
    fn test_race_name_cascade() {
        let generic = r#"<html><head><title>JRA</title></head>
            <body><h1>  </h1><p class="title">第74回 安田記念</p></body></html>"#;
        assert_eq!(RaceDetailParser::parse(generic, URL).race_name, "第74回 安田記念");

        let title_only = r#"<html><head><title> 出馬表 | JRA </title></head><body></body></html>"#;
        assert_eq!(RaceDetailParser::parse(title_only, URL).race_name, "出馬表 | JRA");
    }

    #[test]
    fn test_race_name_never_empty() {
        let detail = RaceDetailParser::parse("<html><body></body></html>", URL);
        assert_eq!(detail.race_name, URL);
        assert!(detail.horses.is_empty());
    }
}
