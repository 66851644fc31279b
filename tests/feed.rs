use axum_procurement_api::error::AppError;
use axum_procurement_api::feed;

const GOOD_FEED: &str = r#"
shop_name: Svyaznoy
categories:
  - id: 224
    name: Smartphones
  - id: 15
    name: Accessories
goods:
  - id: 4216292
    category: 224
    model: apple/iphone/xs-max
    name: Smartphone Apple iPhone XS Max 512GB (golden)
    price: 110000
    price_rrc: 116990
    quantity: 14
    parameters:
      "Screen size (inches)": 6.5
      "Resolution (px)": 2688x1242
      "Built-in memory (GB)": 512
      "Refurbished": false
  - id: 5000001
    category: 15
    model: cable/usb-c
    name: USB-C charging cable 1m
    price: 450
    price_rrc: 590
    quantity: 0
"#;

#[test]
fn parses_well_formed_feed() {
    let parsed = feed::parse(GOOD_FEED).expect("feed should parse");
    assert_eq!(parsed.shop_name, "Svyaznoy");
    assert_eq!(parsed.categories.len(), 2);
    assert_eq!(parsed.goods.len(), 2);

    let phone = &parsed.goods[0];
    assert_eq!(phone.id, 4216292);
    assert_eq!(phone.category, 224);
    assert_eq!(phone.price, 110000);
    assert_eq!(phone.quantity, 14);

    // A good without a parameters block defaults to an empty map.
    assert!(parsed.goods[1].parameters.is_empty());
    assert_eq!(parsed.goods[1].model, "cable/usb-c");

    parsed.validate().expect("feed should validate");
}

// Whatever scalar type the supplier used, the stored value is its text form.
#[test]
fn normalizes_parameter_scalars_to_text() {
    let parsed = feed::parse(GOOD_FEED).expect("feed should parse");
    let parameters: std::collections::BTreeMap<String, String> = parsed.goods[0]
        .parameters
        .clone()
        .into_iter()
        .map(|(name, value)| (name, value.into_string()))
        .collect();

    assert_eq!(parameters["Screen size (inches)"], "6.5");
    assert_eq!(parameters["Resolution (px)"], "2688x1242");
    assert_eq!(parameters["Built-in memory (GB)"], "512");
    assert_eq!(parameters["Refurbished"], "false");
}

#[test]
fn rejects_malformed_document() {
    let err = feed::parse("shop_name: [unterminated").expect_err("should fail");
    match err {
        AppError::Validation { fields, .. } => {
            assert!(fields.contains_key("feed"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn collects_every_validation_problem() {
    let document = r#"
shop_name: "  "
categories:
  - id: 1
    name: Phones
  - id: 1
    name: ""
goods:
  - id: 10
    category: 7
    name: ""
    price: -5
    price_rrc: -1
    quantity: -2
"#;
    let parsed = feed::parse(document).expect("structurally valid");
    let err = parsed.validate().expect_err("must not validate");

    match err {
        AppError::Validation { fields, .. } => {
            assert!(fields.contains_key("shop_name"));
            assert!(fields.contains_key("categories[1].id"));
            assert!(fields.contains_key("categories[1].name"));
            assert!(fields.contains_key("goods[0].name"));
            assert!(fields.contains_key("goods[0].price"));
            assert!(fields.contains_key("goods[0].price_rrc"));
            assert!(fields.contains_key("goods[0].quantity"));
            assert_eq!(
                fields["goods[0].category"],
                "references undeclared category 7"
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

// An empty goods list is a legal way for a supplier to clear its shelf.
#[test]
fn accepts_feed_without_goods() {
    let document = r#"
shop_name: Closing Down
categories: []
goods: []
"#;
    let parsed = feed::parse(document).expect("feed should parse");
    parsed.validate().expect("empty feed is valid");
}
