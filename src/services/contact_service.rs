use std::collections::BTreeMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    audit::log_audit,
    dto::contacts::{
        ContactsDeleted, CreateContactRequest, DeleteContactsRequest, UpdateContactRequest,
    },
    entity::contacts::{
        ActiveModel as ContactActive, Column as ContactCol, Entity as Contacts,
        Model as ContactModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Contact,
    response::{ApiResponse, Meta},
    routes::params::parse_id_list,
    state::AppState,
};

/// Delivery phone contract: `+` followed by 11 digits.
pub fn valid_phone(phone: &str) -> bool {
    phone
        .strip_prefix('+')
        .is_some_and(|rest| rest.len() == 11 && rest.bytes().all(|b| b.is_ascii_digit()))
}

fn require<'a>(
    fields: &mut BTreeMap<String, String>,
    name: &str,
    value: &'a Option<String>,
) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            fields.insert(name.to_string(), "This field is required".to_string());
            ""
        }
    }
}

pub async fn create(
    state: &AppState,
    user: &AuthUser,
    payload: CreateContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    let mut fields = BTreeMap::new();
    let city = require(&mut fields, "city", &payload.city).to_string();
    let street = require(&mut fields, "street", &payload.street).to_string();
    let phone = require(&mut fields, "phone", &payload.phone).to_string();
    if !phone.is_empty() && !valid_phone(&phone) {
        fields.insert(
            "phone".to_string(),
            "must be + followed by 11 digits".to_string(),
        );
    }
    if !fields.is_empty() {
        return Err(AppError::invalid_fields(fields));
    }

    let model = ContactActive {
        id: NotSet,
        user_id: Set(user.user_id),
        city: Set(city),
        street: Set(street),
        house: Set(trimmed(payload.house)),
        structure: Set(trimmed(payload.structure)),
        building: Set(trimmed(payload.building)),
        apartment: Set(trimmed(payload.apartment)),
        phone: Set(phone),
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "contact_create",
        Some("contacts"),
        Some(serde_json::json!({ "contact_id": model.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Contact created",
        contact_from_entity(model),
        None,
    ))
}

pub async fn list(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Vec<Contact>>> {
    let contacts: Vec<Contact> = Contacts::find()
        .filter(ContactCol::UserId.eq(user.user_id))
        .order_by_asc(ContactCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(contact_from_entity)
        .collect();

    Ok(ApiResponse::success("OK", contacts, Some(Meta::empty())))
}

/// A foreign or unknown id is a silent no-op: the caller learns nothing about
/// other users' contacts.
pub async fn update(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    let id = payload
        .id
        .ok_or_else(|| AppError::invalid_field("id", "This field is required"))?;

    let existing = Contacts::find()
        .filter(
            Condition::all()
                .add(ContactCol::Id.eq(id))
                .add(ContactCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    let Some(existing) = existing else {
        return Ok(ApiResponse::empty("OK"));
    };

    let mut fields = BTreeMap::new();
    let city = patch_required(&mut fields, "city", &payload.city);
    let street = patch_required(&mut fields, "street", &payload.street);
    let phone = match payload.phone.as_deref().map(str::trim) {
        Some(v) if !valid_phone(v) => {
            fields.insert(
                "phone".to_string(),
                "must be + followed by 11 digits".to_string(),
            );
            None
        }
        Some(v) => Some(v.to_string()),
        None => None,
    };
    if !fields.is_empty() {
        return Err(AppError::invalid_fields(fields));
    }

    let unchanged = existing.clone();
    let mut active: ContactActive = existing.into();
    let mut dirty = false;
    if let Some(v) = city {
        active.city = Set(v);
        dirty = true;
    }
    if let Some(v) = street {
        active.street = Set(v);
        dirty = true;
    }
    if let Some(v) = phone {
        active.phone = Set(v);
        dirty = true;
    }
    for (value, column) in [
        (&payload.house, &mut active.house),
        (&payload.structure, &mut active.structure),
        (&payload.building, &mut active.building),
        (&payload.apartment, &mut active.apartment),
    ] {
        if let Some(v) = value.as_deref() {
            *column = Set(v.trim().to_string());
            dirty = true;
        }
    }

    let model = if dirty {
        active.update(&state.orm).await?
    } else {
        unchanged
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "contact_update",
        Some("contacts"),
        Some(serde_json::json!({ "contact_id": model.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Contact updated",
        contact_from_entity(model),
        None,
    ))
}

pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    payload: DeleteContactsRequest,
) -> AppResult<ApiResponse<ContactsDeleted>> {
    let items = payload
        .items
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::invalid_field("items", "This field is required"))?;

    let ids = parse_id_list(items);
    if ids.is_empty() {
        return Err(AppError::invalid_field(
            "items",
            "must contain at least one numeric id",
        ));
    }

    let result = Contacts::delete_many()
        .filter(
            Condition::all()
                .add(ContactCol::UserId.eq(user.user_id))
                .add(ContactCol::Id.is_in(ids)),
        )
        .exec(&state.orm)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "contact_delete",
        Some("contacts"),
        Some(serde_json::json!({ "deleted": result.rows_affected })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Contacts deleted",
        ContactsDeleted {
            deleted: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}

fn patch_required(
    fields: &mut BTreeMap<String, String>,
    name: &str,
    value: &Option<String>,
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some("") => {
            fields.insert(name.to_string(), "must not be empty".to_string());
            None
        }
        Some(v) => Some(v.to_string()),
        None => None,
    }
}

fn trimmed(value: Option<String>) -> String {
    value.as_deref().unwrap_or("").trim().to_string()
}

fn contact_from_entity(model: ContactModel) -> Contact {
    Contact {
        id: model.id,
        city: model.city,
        street: model.street,
        house: model.house,
        structure: model.structure,
        building: model.building,
        apartment: model.apartment,
        phone: model.phone,
    }
}
