use pretty_assertions::assert_eq;
use scrape_core::{CatalogItem, Collector, Headline, SENTINEL};

fn item(title: &str, price: f64) -> CatalogItem {
    CatalogItem {
        title: title.to_string(),
        price,
        category: "Poetry".to_string(),
        image_url: "https://books.example/media/a.jpg".to_string(),
    }
}

#[test]
fn catalog_item_uses_published_field_names() {
    let value = serde_json::to_value(item("Olio", 12.5)).unwrap();
    let object = value.as_object().unwrap();

    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["Categoría", "Precio", "Título", "URL de la imagen"]);
    assert_eq!(object["Precio"], serde_json::json!(12.5));
}

#[test]
fn catalog_items_round_trip_through_json() {
    let items = vec![item("Olio", 12.5), item("Mesaerion", 3.0)];
    let text = serde_json::to_string(&items).unwrap();
    let back: Vec<CatalogItem> = serde_json::from_str(&text).unwrap();
    assert_eq!(back, items);
}

#[test]
fn default_headline_uses_sentinels() {
    let headline = Headline::default();
    assert_eq!(headline.title, SENTINEL);
    assert_eq!(headline.url, SENTINEL);
    assert_eq!(headline.score, 0);

    let value = serde_json::to_value(&headline).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"title": "N/A", "score": 0, "url": "N/A"})
    );
}

#[test]
fn collector_keeps_discovery_order_without_dedup() {
    let mut collector = Collector::new();
    assert!(collector.is_empty());
    collector.push("b");
    collector.push("a");
    collector.push("b");

    assert_eq!(collector.len(), 3);
    assert!(collector.reached(3));
    assert!(!collector.reached(4));
    assert_eq!(collector.into_records(), vec!["b", "a", "b"]);
}
