//! Power utility HTML bulletin extraction
//!
//! The utility's notice page lists planned outages in `PowerCutTable`
//! tables: the caption carries a shared ROC date, and each row holds a
//! time cell (`自8時30分<br>至17時0分`) next to an info cell (serial +
//! cause on the first line, candidate addresses on the second). Rows that
//! cannot be read completely are logged and skipped; one bad row never
//! aborts the bulletin.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::parser::datetime::{compose_time, roc_to_date};
use crate::parser::location::parse_address;

/// Serial prefix (latin/digits) followed by the free-text cause
static SERIAL_INFO: LazyLock<Regex> = LazyLock::new(|| Regex::new("([A-Za-z\\d]*)(.+)").unwrap());

/// Punctuation variants the bulletin uses inside address enumerations
static ADDRESS_JOINERS: &[char] = &['‧', '、', '－', '之', '至', '及'];

/// One outage row extracted from the bulletin table
#[derive(Debug, Clone)]
pub struct BulletinRow {
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub serial: String,
    pub description: String,
    pub address: String,
}

/// Extract all outage rows from a bulletin page.
pub fn parse_bulletin(html: &str) -> Vec<BulletinRow> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse(".PowerCutTable").unwrap();
    let caption_sel = Selector::parse("caption").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let mut rows = Vec::new();

    for table in document.select(&table_sel) {
        let date = match table
            .select(&caption_sel)
            .next()
            .and_then(|c| parse_caption_date(c))
        {
            Some(d) => d,
            None => {
                warn!(source = "power", "bulletin table caption has no usable date, skipping table");
                continue;
            }
        };

        // Cells come in (time, info) pairs per outage.
        let cells: Vec<ElementRef> = table.select(&td_sel).collect();
        for pair in cells.chunks(2) {
            let &[time_cell, info_cell] = pair else {
                warn!(source = "power", "bulletin table has a dangling cell, skipping");
                continue;
            };
            match parse_row(date, time_cell, info_cell) {
                Some(row) => rows.push(row),
                None => warn!(source = "power", %date, "unreadable bulletin row skipped"),
            }
        }
    }

    rows
}

fn parse_row(date: NaiveDate, time_cell: ElementRef, info_cell: ElementRef) -> Option<BulletinRow> {
    let time_chunks = text_chunks(time_cell);
    let info_chunks = text_chunks(info_cell);
    if time_chunks.len() < 2 || info_chunks.len() < 2 {
        return None;
    }

    let start_time = parse_clock(&time_chunks[0], '自');
    let end_time = parse_clock(&time_chunks[1], '至');
    let (serial, description) = parse_serial_description(&info_chunks[0])?;
    let address = pick_address(&info_chunks[1])?;

    Some(BulletinRow {
        date,
        start_time,
        end_time,
        serial,
        description,
        address,
    })
}

/// Non-empty text nodes of a cell; `<br>` separated lines arrive as
/// consecutive chunks.
fn text_chunks(cell: ElementRef) -> Vec<String> {
    cell.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Shared caption date: strip the `停電日期：` label, split the ROC
/// `年/月/日` digits, zero-pad, and reuse the 7-digit date path.
fn parse_caption_date(caption: ElementRef) -> Option<NaiveDate> {
    let raw = caption.text().map(str::trim).find(|t| !t.is_empty())?;
    let token: String = raw
        .replace("停電日期：", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let groups: Vec<&str> = token.split(['年', '月', '日']).collect();
    if groups.len() < 3 || groups[..3].iter().any(|g| g.is_empty()) {
        return None;
    }

    let roc = format!("{}{:0>2}{:0>2}", groups[0], groups[1], groups[2]);
    roc_to_date(&roc).ok()
}

/// `自8時30分` / `至17時0分` cell lines
fn parse_clock(raw: &str, label: char) -> Option<NaiveTime> {
    let token: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != label)
        .collect();
    let (hour, minute) = token.split_once('時')?;
    compose_time(None, hour, Some(minute))
}

/// First line of the info cell: serial + cause, with the original feed's
/// quirks (parenthesized 短暫停電 remark) folded into the description.
fn parse_serial_description(raw: &str) -> Option<(String, String)> {
    let token: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let token = token
        .replace("短暫停電", "-短暫停電")
        .replace('(', "")
        .replace(",因)", "")
        .replace(')', "");

    let caps = SERIAL_INFO.captures(&token)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Second line of the info cell enumerates candidate addresses separated by
/// full-width commas; take the first one the address pattern recognizes.
fn pick_address(raw: &str) -> Option<String> {
    for candidate in raw.split('，') {
        let cleaned: String = candidate
            .chars()
            .map(|c| if ADDRESS_JOINERS.contains(&c) { '-' } else { c })
            .collect();
        let parts = parse_address(&cleaned);
        if !parts.is_unknown() {
            return Some(format!(
                "{}{}{}{}",
                parts.city, parts.district, parts.road, parts.detail
            ));
        }
    }
    None
}
