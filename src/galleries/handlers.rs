use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    middleware,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use tower_cookies::Cookies;
use tracing::{info, instrument, warn};

use super::dto::{GalleryForm, GalleryPage};
use super::images::Image;
use super::repo_types::Gallery;
use crate::auth::extractors::{AuthUser, MaybeUser};
use crate::auth::middleware::require_user;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::repo_types::User;
use crate::views::{self, Alert, Data};

const UPLOAD_FIELD: &str = "images";
const LINK_FIELD: &str = "files";
pub(crate) const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn gallery_routes() -> Router<AppState> {
    let owner = Router::new()
        .route("/galleries", get(index).post(create))
        .route("/galleries/new", get(new_page))
        .route("/galleries/:id/edit", get(edit))
        .route("/galleries/:id/update", post(update))
        .route("/galleries/:id/delete", post(delete))
        .route("/galleries/:id/images", post(upload_images))
        .route("/galleries/:id/images/link", post(link_images))
        .route("/galleries/:id/images/:filename/delete", post(delete_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .route_layer(middleware::from_fn(require_user));

    Router::new()
        .route("/galleries/:id", get(show))
        .merge(owner)
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidId),
    }
}

fn edit_path(id: i64) -> String {
    format!("/galleries/{id}/edit")
}

/// Loads the gallery and checks that `user` owns it.
async fn owned_gallery(state: &AppState, raw_id: &str, user: &User) -> Result<Gallery, AppError> {
    let gallery = state.galleries.by_id(parse_id(raw_id)?).await?;
    if gallery.user_id != user.id {
        warn!(gallery_id = gallery.id, user_id = user.id, "gallery access denied");
        return Err(AppError::Forbidden);
    }
    Ok(gallery)
}

async fn gallery_page(state: &AppState, gallery: &Gallery) -> Result<GalleryPage, AppError> {
    let images = state.images.by_gallery_id(gallery.id).await?;
    Ok(GalleryPage::new(gallery, &images))
}

/// Edit page, optionally carrying an alert.
async fn render_edit(
    state: &AppState,
    cookies: &Cookies,
    user: &User,
    gallery: &Gallery,
    alert: Option<Alert>,
) -> Result<Response, AppError> {
    let mut data = Data::new(gallery_page(state, gallery).await?).with_user(Some(user));
    data.alert = alert;
    Ok(views::render(cookies, "galleries/edit.html", data))
}

#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
) -> Result<Response, AppError> {
    let galleries = state.galleries.by_user_id(user.id).await?;
    Ok(views::render(
        &cookies,
        "galleries/index.html",
        Data::new(galleries).with_user(Some(&user)),
    ))
}

#[instrument(skip_all)]
async fn new_page(cookies: Cookies, AuthUser(user): AuthUser) -> Response {
    views::render(
        &cookies,
        "galleries/new.html",
        Data::new(GalleryForm::default()).with_user(Some(&user)),
    )
}

#[instrument(skip_all)]
async fn create(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    Form(form): Form<GalleryForm>,
) -> Response {
    let mut gallery = Gallery {
        user_id: user.id,
        title: form.title.clone(),
        ..Default::default()
    };
    if let Err(e) = state.galleries.create(&mut gallery).await {
        warn!(error = %e, user_id = user.id, "create gallery rejected");
        let mut data = Data::new(form).with_user(Some(&user));
        data.set_alert(&e);
        return views::render(&cookies, "galleries/new.html", data);
    }
    info!(gallery_id = gallery.id, user_id = user.id, "gallery created");
    views::redirect(&edit_path(gallery.id))
}

/// Public page; no session needed.
#[instrument(skip_all)]
async fn show(
    State(state): State<AppState>,
    cookies: Cookies,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let gallery = state.galleries.by_id(parse_id(&id)?).await?;
    let page = gallery_page(&state, &gallery).await?;
    Ok(views::render(
        &cookies,
        "galleries/show.html",
        Data::new(page).with_user(user.as_ref()),
    ))
}

#[instrument(skip_all)]
async fn edit(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let gallery = owned_gallery(&state, &id, &user).await?;
    render_edit(&state, &cookies, &user, &gallery, None).await
}

#[instrument(skip_all)]
async fn update(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<GalleryForm>,
) -> Result<Response, AppError> {
    let gallery = owned_gallery(&state, &id, &user).await?;
    let mut updated = Gallery {
        title: form.title,
        ..gallery.clone()
    };
    let alert = match state.galleries.update(&mut updated).await {
        Ok(()) => {
            info!(gallery_id = updated.id, "gallery updated");
            Alert::success("Gallery updated successfully!")
        }
        Err(e) => {
            warn!(error = %e, gallery_id = gallery.id, "update gallery rejected");
            updated = gallery;
            Alert::error(e.user_message())
        }
    };
    render_edit(&state, &cookies, &user, &updated, Some(alert)).await
}

#[instrument(skip_all)]
async fn delete(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let gallery = owned_gallery(&state, &id, &user).await?;
    if let Err(e) = state.galleries.delete(gallery.id).await {
        warn!(error = %e, gallery_id = gallery.id, "delete gallery failed");
        return render_edit(&state, &cookies, &user, &gallery, Some(Alert::error(e.user_message())))
            .await;
    }
    info!(gallery_id = gallery.id, "gallery deleted");
    Ok(views::redirect("/galleries"))
}

/// Stores every file in the `images` multipart field.
#[instrument(skip_all)]
async fn upload_images(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    mut mp: Multipart,
) -> Result<Response, AppError> {
    let gallery = owned_gallery(&state, &id, &user).await?;

    let stored = async {
        let mut count = 0usize;
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| AppError::Upstream(e.into()))?
        {
            if field.name() != Some(UPLOAD_FIELD) {
                continue;
            }
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Upstream(e.into()))?;
            state.images.create(gallery.id, &data, &filename).await?;
            count += 1;
        }
        Ok::<_, AppError>(count)
    }
    .await;

    match stored {
        Ok(count) => {
            info!(gallery_id = gallery.id, count, "images uploaded");
            Ok(views::redirect(&edit_path(gallery.id)))
        }
        Err(e) => {
            warn!(error = %e, gallery_id = gallery.id, "image upload failed");
            render_edit(&state, &cookies, &user, &gallery, Some(Alert::error(e.user_message())))
                .await
        }
    }
}

#[instrument(skip_all)]
async fn delete_image(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    Path((id, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let gallery = owned_gallery(&state, &id, &user).await?;
    if let Err(e) = state.images.delete(&Image::new(gallery.id, filename)).await {
        warn!(error = %e, gallery_id = gallery.id, "delete image failed");
        return render_edit(&state, &cookies, &user, &gallery, Some(Alert::error(e.user_message())))
            .await;
    }
    Ok(views::redirect(&edit_path(gallery.id)))
}

/// Downloads each `files` URL into the gallery concurrently.
#[instrument(skip_all)]
async fn link_images(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let gallery = owned_gallery(&state, &id, &user).await?;
    let urls: Vec<String> = fields
        .into_iter()
        .filter(|(name, url)| name == LINK_FIELD && !url.trim().is_empty())
        .map(|(_, url)| url)
        .collect();

    state.images.fetch_links(&state.http, gallery.id, urls).await;
    Ok(views::redirect(&edit_path(gallery.id)))
}
