//! Rendering of a load posting into the HTML notification message.
//!
//! The layout mirrors what dispatchers are used to reading: date, route,
//! price with and without VAT, vehicle and cargo names resolved through the
//! glossary, firm rating, contacts, and the free-text note. Every missing
//! field renders the same placeholder instead of being omitted, so messages
//! keep a stable shape.

use crate::glossary::Glossary;
use haulwatch_common::load::LoadItem;
use serde_json::Value;

const NO_DATA: &str = "Не доступно";

pub fn render_notification(item: &LoadItem, glossary: &Glossary) -> String {
    let first_date = item
        .loading
        .as_ref()
        .and_then(|l| l.first_date.as_deref())
        .and_then(format_date)
        .unwrap_or_else(|| NO_DATA.to_string());

    let (tooltip, distance) = match &item.route {
        Some(route) => (
            route
                .distance_tooltip
                .clone()
                .unwrap_or_else(|| NO_DATA.to_string()),
            route
                .distance
                .as_ref()
                .map(value_to_text)
                .unwrap_or_else(|| NO_DATA.to_string()),
        ),
        None => (NO_DATA.to_string(), NO_DATA.to_string()),
    };

    let (price_nds, price_no_nds) = match &item.rate {
        Some(rate) => (
            format_price(rate.price + rate.price_nds),
            format_price(rate.price + rate.price_no_nds),
        ),
        None => ("0".to_string(), "0".to_string()),
    };

    let car_types = item
        .truck
        .as_ref()
        .filter(|t| !t.car_types.is_empty())
        .map(|t| {
            t.car_types
                .iter()
                .map(|id| {
                    glossary
                        .car_type_name(id)
                        .map(str::to_string)
                        .unwrap_or_else(|| id.clone())
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_else(|| NO_DATA.to_string());

    let cargos = item
        .loading
        .as_ref()
        .filter(|l| !l.loading_cargos.is_empty())
        .map(|l| {
            l.loading_cargos
                .iter()
                .map(|c| {
                    glossary
                        .cargo_name(&c.name_id)
                        .map(str::to_string)
                        .unwrap_or_else(|| value_to_text(&c.name_id))
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_else(|| NO_DATA.to_string());

    let rating = item
        .firm
        .as_ref()
        .and_then(|f| f.rating.as_ref())
        .and_then(|r| r.score)
        .filter(|score| *score >= 1.0)
        .map(|score| "⭐️".repeat(score as usize))
        .unwrap_or_else(|| NO_DATA.to_string());

    let contacts = item
        .firm
        .as_ref()
        .filter(|f| !f.contacts.is_empty())
        .map(|f| {
            f.contacts
                .iter()
                .map(|contact| {
                    let name = contact.name.as_deref().unwrap_or(NO_DATA);
                    let phones = if contact.phones.is_empty() {
                        NO_DATA.to_string()
                    } else {
                        contact
                            .phones
                            .iter()
                            .filter_map(|p| p.number.as_ref())
                            .map(|n| format!("⤷ +{}", digits_only(&value_to_text(n))))
                            .collect::<Vec<_>>()
                            .join("\n")
                    };
                    format!("Имя: {name}\n{phones}")
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_else(|| NO_DATA.to_string());

    let note = item.note.as_deref().unwrap_or(NO_DATA);

    format!(
        "\n<b>📅 {first_date}</b>\n\
         <b>🔀 Маршрут:</b> {tooltip} ({distance}км)\n\
         <b>💰 Оплата:</b>\n\
         ⤷ С НДС: {price_nds}р.\n\
         ⤷ БЕЗ НДС: {price_no_nds}р.\n\
         <b>🚚 Авто:</b>\n\
         {car_types}\n\
         <b>📦 Груз:</b>\n\
         {cargos}\n\
         <b>Рейтинг:</b> {rating}\n\
         <b>📞 Контакты:</b>\n\
         {contacts}\n\
         <b>🗒 Заметка:</b>\n\
         <i>{note}</i>\n"
    )
}

/// ISO date(-time) → `dd.mm.yyyy`. The board sends local datetimes without
/// an offset; only the date part matters for the message.
fn format_date(raw: &str) -> Option<String> {
    let date_part = raw.get(..10)?;
    let date = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    Some(date.format("%d.%m.%Y").to_string())
}

fn format_price(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn value_to_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glossary::GlossaryEntry;
    use haulwatch_common::load::SearchPayload;
    use serde_json::json;

    fn glossary() -> Glossary {
        Glossary::from_entries(
            vec![GlossaryEntry {
                id: json!("10"),
                name: "Тент".into(),
            }],
            vec![GlossaryEntry {
                id: json!(200),
                name: "Металл".into(),
            }],
        )
    }

    fn item(json: &str) -> LoadItem {
        let payload: SearchPayload =
            serde_json::from_str(&format!(r#"{{"loads":[{json}]}}"#)).unwrap();
        payload.loads.into_iter().next().unwrap()
    }

    #[test]
    fn renders_a_complete_posting() {
        let load = item(
            r#"{
                "id":"L1",
                "loading":{"firstDate":"2022-10-24T00:00:00","loadingCargos":[{"nameId":200}]},
                "route":{"distance":450,"distanceTooltip":"Москва — Тула"},
                "truck":{"carTypes":["10"]},
                "rate":{"price":50000,"priceNds":6000,"priceNoNds":0},
                "firm":{"rating":{"score":4},"contacts":[{"name":"Иван","phones":[{"number":"+7 (900) 111-22-33"}]}]},
                "note":"срочно"
            }"#,
        );
        let text = render_notification(&load, &glossary());
        assert!(text.contains("24.10.2022"));
        assert!(text.contains("Москва — Тула (450км)"));
        assert!(text.contains("С НДС: 56000р."));
        assert!(text.contains("БЕЗ НДС: 50000р."));
        assert!(text.contains("Тент"));
        assert!(text.contains("Металл"));
        assert!(text.contains("⭐️⭐️⭐️⭐️"));
        assert!(text.contains("Имя: Иван"));
        assert!(text.contains("⤷ +79001112233"));
        assert!(text.contains("<i>срочно</i>"));
    }

    #[test]
    fn missing_fields_fall_back_to_placeholder() {
        let load = item(r#"{"id":"L2"}"#);
        let text = render_notification(&load, &Glossary::default());
        // Date, route, vehicle, cargo, rating, contacts, note all degrade.
        assert_eq!(text.matches(NO_DATA).count(), 8);
        assert!(text.contains("С НДС: 0р."));
    }

    #[test]
    fn unknown_glossary_ids_render_raw() {
        let load = item(
            r#"{"id":"L3","truck":{"carTypes":["99"]},
                "loading":{"loadingCargos":[{"nameId":777}]}}"#,
        );
        let text = render_notification(&load, &glossary());
        assert!(text.contains("99"));
        assert!(text.contains("777"));
    }

    #[test]
    fn zero_score_has_no_stars() {
        let load = item(r#"{"id":"L4","firm":{"rating":{"score":0}}}"#);
        let text = render_notification(&load, &Glossary::default());
        assert!(!text.contains("⭐️"));
    }
}
