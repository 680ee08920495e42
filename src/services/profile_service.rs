use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    Set, sea_query::OnConflict,
};
use validator::Validate;

use crate::{
    dto::profile::UpdateProfileRequest,
    entity::{
        user_profiles::{ActiveModel, Column, Entity as UserProfiles, Model as ProfileModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// The caller's profile row, created empty on first access.
pub async fn get_or_create<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<ProfileModel> {
    if let Some(profile) = UserProfiles::find()
        .filter(Column::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(profile);
    }

    let blank = ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        fname: Set(String::new()),
        lname: Set(String::new()),
        phone: Set(String::new()),
        address: Set(String::new()),
        city: Set(String::new()),
        zip_code: Set(String::new()),
    };
    UserProfiles::insert(blank)
        .on_conflict(OnConflict::column(Column::UserId).do_nothing().to_owned())
        .do_nothing()
        .exec(conn)
        .await?;
    tracing::debug!(user_id, "profile created on first access");

    UserProfiles::find()
        .filter(Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))
}

async fn user_email(state: &AppState, user_id: i64) -> AppResult<String> {
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .map(|u| u.email)
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let email = user_email(state, user.user_id).await?;
    let profile = get_or_create(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success(
        "OK",
        Profile::from_entity(profile, email),
        None,
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    payload.validate()?;
    let email = user_email(state, user.user_id).await?;
    let profile = get_or_create(&state.orm, user.user_id).await?;

    let mut active: ActiveModel = profile.into();
    if let Some(fname) = payload.fname {
        active.fname = Set(fname);
    }
    if let Some(lname) = payload.lname {
        active.lname = Set(lname);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    if let Some(zip_code) = payload.zip_code {
        active.zip_code = Set(zip_code);
    }
    let profile = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        Profile::from_entity(profile, email),
        Some(Meta::empty()),
    ))
}
