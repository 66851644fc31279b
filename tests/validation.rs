use axum_procurement_api::dto::partner::StateFlag;
use axum_procurement_api::models::{OrderState, UserRole};
use axum_procurement_api::routes::params::{Pagination, parse_id_list};
use axum_procurement_api::services::contact_service::valid_phone;

#[test]
fn order_state_round_trips_through_text() {
    let states = [
        OrderState::Basket,
        OrderState::New,
        OrderState::Confirmed,
        OrderState::Assembled,
        OrderState::Sent,
        OrderState::Delivered,
        OrderState::Canceled,
    ];
    for state in states {
        assert_eq!(OrderState::parse(state.as_str()), Some(state));
    }
    assert_eq!(OrderState::parse("shipped"), None);
    assert_eq!(OrderState::parse("Basket"), None);
}

#[test]
fn terminal_states_are_delivered_and_canceled() {
    assert!(OrderState::Delivered.is_terminal());
    assert!(OrderState::Canceled.is_terminal());
    assert!(!OrderState::Basket.is_terminal());
    assert!(!OrderState::New.is_terminal());
    assert!(!OrderState::Sent.is_terminal());
}

#[test]
fn user_role_parses_known_roles_only() {
    assert_eq!(UserRole::parse("buyer"), Some(UserRole::Buyer));
    assert_eq!(UserRole::parse("shop"), Some(UserRole::Shop));
    assert_eq!(UserRole::parse("admin"), None);
    assert_eq!(UserRole::Shop.as_str(), "shop");
}

#[test]
fn id_list_keeps_only_plain_digit_tokens() {
    assert_eq!(parse_id_list("1,2,3"), vec![1, 2, 3]);
    assert_eq!(parse_id_list(" 4 , 5,6 "), vec![4, 5, 6]);
    assert_eq!(parse_id_list("1,abc,2,-3,4.5,"), vec![1, 2]);
    assert_eq!(parse_id_list("abc"), Vec::<i32>::new());
    assert_eq!(parse_id_list(""), Vec::<i32>::new());
    // A digit run that overflows i32 is dropped rather than erroring.
    assert_eq!(parse_id_list("99999999999999999999,7"), vec![7]);
}

#[test]
fn phone_requires_plus_and_eleven_digits() {
    assert!(valid_phone("+79991234567"));
    assert!(!valid_phone("79991234567"));
    assert!(!valid_phone("+7999123456"));
    assert!(!valid_phone("+799912345678"));
    assert!(!valid_phone("+7999123456a"));
    assert!(!valid_phone(""));
}

#[test]
fn state_flag_accepts_bools_and_loose_strings() {
    assert_eq!(StateFlag::Bool(true).as_bool(), Some(true));
    assert_eq!(StateFlag::Bool(false).as_bool(), Some(false));

    for on in ["y", "Yes", "t", "TRUE", "on", "1"] {
        assert_eq!(StateFlag::Text(on.into()).as_bool(), Some(true), "{on}");
    }
    for off in ["n", "No", "f", "FALSE", "off", "0"] {
        assert_eq!(StateFlag::Text(off.into()).as_bool(), Some(false), "{off}");
    }
    assert_eq!(StateFlag::Text("maybe".into()).as_bool(), None);
    assert_eq!(StateFlag::Text("".into()).as_bool(), None);
}

#[test]
fn pagination_clamps_to_sane_bounds() {
    let (page, per_page, offset) = Pagination {
        page: None,
        per_page: None,
    }
    .normalize();
    assert_eq!((page, per_page, offset), (1, 20, 0));

    let (page, per_page, offset) = Pagination {
        page: Some(3),
        per_page: Some(10),
    }
    .normalize();
    assert_eq!((page, per_page, offset), (3, 10, 20));

    let (page, per_page, _) = Pagination {
        page: Some(-2),
        per_page: Some(1000),
    }
    .normalize();
    assert_eq!((page, per_page), (1, 100));
}
