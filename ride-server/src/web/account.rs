//! Sign in, registration, the user's profile and public driver pages.

use std::collections::{BTreeSet, HashMap};

use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use futures::future::join_all;
use tracing::{info, warn};

use crate::backend::{AuthSession, BackendError};
use crate::domain::{ProfileUpdate, User, UserId};
use crate::session::{Session, SessionUser, clear_session_cookie, session_cookie};

use super::forms::{FormError, LoginForm, ProfileForm, RegisterForm, validate_picture};
use super::notice::Notice;
use super::routes::{AppError, Viewer, parse_user_id, render};
use super::state::AppState;
use super::templates::*;

fn messages(errors: &[FormError]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}

// ============================================================================
// Sign in and registration
// ============================================================================

#[derive(Default)]
struct LoginPage {
    login_email: String,
    login_errors: Vec<String>,
    register_name: String,
    register_email: String,
    register_errors: Vec<String>,
}

fn login_response(
    viewer: &Viewer,
    page: LoginPage,
    notice: Option<Notice>,
    status: StatusCode,
) -> Result<Response, AppError> {
    let template = LoginTemplate {
        nav: viewer.nav(),
        notice: NoticeView::maybe(notice),
        login_email: page.login_email,
        login_errors: page.login_errors,
        register_name: page.register_name,
        register_email: page.register_email,
        register_errors: page.register_errors,
    };
    Ok((status, render(&template)?).into_response())
}

/// Sign in and register forms.
pub(super) async fn login_page(
    viewer: Viewer,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    login_response(
        &viewer,
        LoginPage::default(),
        Notice::from_params(&params),
        StatusCode::OK,
    )
}

/// Replace the browser's session with a fresh signed-in one and redirect.
///
/// A new session id is issued on every sign in; the old session and its
/// search state are dropped.
async fn start_session(
    state: &AppState,
    viewer: &Viewer,
    auth: AuthSession,
    notice: Notice,
) -> Response {
    if let Some(old) = viewer.sid.as_deref() {
        state.sessions.remove(old).await;
        state.search_views.remove(old).await;
    }

    if auth.credentials.is_none() {
        warn!(user = %auth.user.id, "Signed in without backend credentials");
    }
    let session = Session::signed_in(SessionUser::from_user(&auth.user), auth.credentials);
    let sid = state.sessions.create(session).await;
    info!(user = %auth.user.id, "Signed in");

    (
        [(header::SET_COOKIE, session_cookie(&sid))],
        Redirect::to(&notice.redirect_to("/")),
    )
        .into_response()
}

/// Refuse banned accounts, logging them straight back out of the backend.
async fn refuse_if_banned(state: &AppState, auth: &AuthSession) -> Option<String> {
    if !auth.user.is_banned {
        return None;
    }

    warn!(user = %auth.user.id, "Banned user tried to sign in");
    if let Some(credentials) = &auth.credentials {
        if let Err(e) = state.backend.backend().logout(credentials).await {
            warn!(error = %e, "Failed to end banned user's backend session");
        }
    }
    Some("This account has been banned. Contact support if you think this is a mistake.".into())
}

/// Sign in.
pub(super) async fn login(
    State(state): State<AppState>,
    viewer: Viewer,
    Form(params): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let form = LoginForm::from_params(&params);
    let failed = |errors: Vec<String>, status: StatusCode| {
        let page = LoginPage {
            login_email: form.email.clone(),
            login_errors: errors,
            ..LoginPage::default()
        };
        login_response(&viewer, page, None, status)
    };

    if let Err(errors) = form.validate() {
        return failed(messages(&errors), StatusCode::UNPROCESSABLE_ENTITY);
    }

    let auth = match state.backend.backend().login(&form.email, &form.password).await {
        Ok(auth) => auth,
        Err(BackendError::Unauthorized) => {
            return failed(
                vec!["Incorrect email or password.".into()],
                StatusCode::UNAUTHORIZED,
            );
        }
        Err(e) => {
            let err = AppError::from(e);
            return failed(vec![err.message()], err.status());
        }
    };

    if let Some(message) = refuse_if_banned(&state, &auth).await {
        return failed(vec![message], StatusCode::FORBIDDEN);
    }

    Ok(start_session(&state, &viewer, auth, Notice::SignedIn).await)
}

/// Create an account, then sign in with it.
pub(super) async fn register(
    State(state): State<AppState>,
    viewer: Viewer,
    Form(params): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let form = RegisterForm::from_params(&params);
    let failed = |errors: Vec<String>, status: StatusCode| {
        let page = LoginPage {
            register_name: form.name.clone(),
            register_email: form.email.clone(),
            register_errors: errors,
            ..LoginPage::default()
        };
        login_response(&viewer, page, None, status)
    };

    if let Err(errors) = form.validate() {
        return failed(messages(&errors), StatusCode::UNPROCESSABLE_ENTITY);
    }

    let backend = state.backend.backend();
    if let Err(e) = backend.register(&form.name, &form.email, &form.password).await {
        let err = AppError::from(e);
        return failed(vec![err.message()], err.status());
    }
    info!(email = %form.email, "Account registered");

    match backend.login(&form.email, &form.password).await {
        Ok(auth) => Ok(start_session(&state, &viewer, auth, Notice::Registered).await),
        Err(e) => {
            warn!(error = %e, "Sign in after registration failed");
            let page = LoginPage {
                login_email: form.email.clone(),
                ..LoginPage::default()
            };
            login_response(&viewer, page, Some(Notice::Registered), StatusCode::OK)
        }
    }
}

/// Sign out. Ending the backend session is best effort.
pub(super) async fn logout(State(state): State<AppState>, viewer: Viewer) -> Response {
    if let Some(credentials) = &viewer.session.credentials {
        if let Err(e) = state.backend.backend().logout(credentials).await {
            warn!(error = %e, "Backend logout failed");
        }
    }
    if let Some(sid) = viewer.sid.as_deref() {
        state.sessions.remove(sid).await;
        state.search_views.remove(sid).await;
    }
    if let Some(user) = &viewer.session.user {
        info!(user = %user.id, "Signed out");
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to(&Notice::SignedOut.redirect_to("/")),
    )
        .into_response()
}

// ============================================================================
// Profile
// ============================================================================

struct ProfileErrors {
    form: Option<ProfileForm>,
    errors: Vec<String>,
    picture_error: Option<String>,
}

async fn profile_response(
    state: &AppState,
    viewer: &Viewer,
    notice: Option<Notice>,
    failure: Option<ProfileErrors>,
    status: StatusCode,
) -> Result<Response, AppError> {
    let (session_user, _) = viewer.require_user()?;
    let user = state.backend.backend().get_user(&session_user.id).await?;

    let (form, errors, picture_error) = match failure {
        Some(f) => (f.form, f.errors, f.picture_error),
        None => (None, Vec::new(), None),
    };
    let form = form.unwrap_or_else(|| ProfileForm {
        name: user.name.clone(),
        bio: user.profile.bio.clone().unwrap_or_default(),
    });

    let template = ProfileTemplate {
        nav: viewer.nav(),
        notice: NoticeView::maybe(notice),
        profile: ProfileView::from_user(&user, &state.config),
        name: form.name,
        bio: form.bio,
        errors,
        picture_error,
    };
    Ok((status, render(&template)?).into_response())
}

/// The viewer's profile.
pub(super) async fn profile_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    profile_response(&state, &viewer, Notice::from_params(&params), None, StatusCode::OK).await
}

/// Apply `update` to the viewer's account and keep the session's name in
/// step with it.
async fn save_profile(
    state: &AppState,
    viewer: &Viewer,
    update: &ProfileUpdate,
) -> Result<(), AppError> {
    let (session_user, credentials) = viewer.require_user()?;
    let backend = state.backend.backend();
    let current = backend.get_user(&session_user.id).await?;
    backend
        .update_user(credentials, &session_user.id, update, &current.profile)
        .await?;

    if let (Some(sid), Some(name)) = (viewer.sid.as_deref(), &update.name) {
        let mut session = viewer.session.clone();
        if let Some(user) = session.user.as_mut() {
            user.name = name.clone();
        }
        state.sessions.update(sid, session).await;
    }
    // Ride cards embed the driver's name, bio and picture.
    state.backend.invalidate_cache();
    Ok(())
}

/// Save name and bio.
pub(super) async fn update_profile(
    State(state): State<AppState>,
    viewer: Viewer,
    Form(params): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    viewer.require_user()?;
    let form = ProfileForm::from_params(&params);

    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => {
            let failure = ProfileErrors {
                form: Some(form),
                errors: messages(&errors),
                picture_error: None,
            };
            return profile_response(
                &state,
                &viewer,
                None,
                Some(failure),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    match save_profile(&state, &viewer, &update).await {
        Ok(()) => Ok(Redirect::to(&Notice::ProfileUpdated.redirect_to("/profile")).into_response()),
        Err(err @ AppError::SignInRequired { .. }) => Err(err),
        Err(err) => {
            let status = err.status();
            let failure = ProfileErrors {
                form: Some(form),
                errors: vec![err.message()],
                picture_error: None,
            };
            profile_response(&state, &viewer, None, Some(failure), status).await
        }
    }
}

/// An uploaded file pulled out of the multipart body.
struct Upload {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

async fn read_picture(multipart: &mut Multipart) -> Result<Option<Upload>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::BadRequest {
        message: format!("Malformed upload: {}", e),
    })? {
        if field.name() != Some("picture") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("picture").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| AppError::BadRequest {
            message: format!("Malformed upload: {}", e),
        })?;
        return Ok(Some(Upload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

/// Upload a new profile picture.
pub(super) async fn upload_picture(
    State(state): State<AppState>,
    viewer: Viewer,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let (_, credentials) = viewer.require_user()?;

    let picture_failed = |message: String, status: StatusCode| {
        let failure = ProfileErrors {
            form: None,
            errors: Vec::new(),
            picture_error: Some(message),
        };
        profile_response(&state, &viewer, None, Some(failure), status)
    };

    let upload = read_picture(&mut multipart).await?;
    let size = upload.as_ref().map_or(0, |u| u.bytes.len());
    let content_type = upload.as_ref().and_then(|u| u.content_type.as_deref());
    if let Err(e) = validate_picture(content_type, size) {
        return picture_failed(e.to_string(), StatusCode::UNPROCESSABLE_ENTITY).await;
    }
    let Some(upload) = upload else {
        return picture_failed(FormError::MissingFile.to_string(), StatusCode::UNPROCESSABLE_ENTITY)
            .await;
    };

    let content_type = upload.content_type.unwrap_or_default();
    let stored = match state
        .backend
        .backend()
        .upload_image(credentials, &upload.file_name, &content_type, upload.bytes)
        .await
    {
        Ok(stored) => stored,
        Err(e) => {
            let err = AppError::from(e);
            if matches!(err, AppError::SignInRequired { .. }) {
                return Err(err);
            }
            return picture_failed(err.message(), err.status()).await;
        }
    };

    let update = ProfileUpdate {
        profile_picture: Some(stored),
        ..ProfileUpdate::default()
    };
    match save_profile(&state, &viewer, &update).await {
        Ok(()) => Ok(Redirect::to(&Notice::PictureUpdated.redirect_to("/profile")).into_response()),
        Err(err @ AppError::SignInRequired { .. }) => Err(err),
        Err(err) => picture_failed(err.message(), err.status()).await,
    }
}

// ============================================================================
// Driver profile
// ============================================================================

/// Public driver page with reviews.
pub(super) async fn driver_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    let id = parse_user_id(&id)?;
    let backend = state.backend.backend();

    let (user, summary) = tokio::join!(backend.get_user(&id), backend.reviews_for(&id));
    let user = user?;
    let summary = summary.unwrap_or_else(|e| {
        warn!(user = %id, error = %e, "Failed to load reviews");
        Default::default()
    });

    let reviewer_ids: Vec<UserId> = summary
        .reviews
        .iter()
        .map(|r| r.owner.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let reviewers: HashMap<UserId, User> = join_all(reviewer_ids.iter().map(|r| backend.get_user(r)))
        .await
        .into_iter()
        .filter_map(Result::ok)
        .map(|u| (u.id.clone(), u))
        .collect();

    let reviews = summary
        .reviews
        .iter()
        .map(|r| ReviewView::new(r, reviewers.get(&r.owner), &state.config))
        .collect();

    render(&DriverTemplate {
        nav: viewer.nav(),
        notice: NoticeView::maybe(Notice::from_params(&params)),
        driver: DriverView::new(
            &user,
            summary.score,
            summary.stars(),
            summary.reviews.len(),
            &state.config,
        ),
        reviews,
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};

    use super::super::routes::test_support::*;

    #[tokio::test]
    async fn sign_in_and_out() {
        let app = app();

        let response = send(
            &app,
            post_form("/login", "email=amira%40rideshare.tn&password=wrong", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Incorrect email or password."));

        let cookie = sign_in(&app, "amira@rideshare.tn", "amira123").await;
        let html = body_text(send(&app, get("/", Some(&cookie))).await).await;
        assert!(html.contains("Amira Ben Salah"));

        let response = send(&app, post_form("/logout", "", Some(&cookie))).await;
        assert_eq!(location(&response), "/?notice=signed_out");

        // The old session id no longer signs anyone in.
        let response = send(&app, get("/profile", Some(&cookie))).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn banned_user_is_refused() {
        let app = app();
        let response = send(
            &app,
            post_form("/login", "email=sami%40rideshare.tn&password=sami123", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(body_text(response).await.contains("This account has been banned."));
    }

    #[tokio::test]
    async fn register_signs_in() {
        let app = app();
        let response = send(
            &app,
            post_form(
                "/register",
                "name=Lina&email=lina%40rideshare.tn&password=secret1",
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/?notice=registered");

        let response = send(
            &app,
            post_form(
                "/register",
                "name=Lina&email=lina%40rideshare.tn&password=secret1",
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Email already registered"));
    }

    #[tokio::test]
    async fn profile_update_renames_session() {
        let app = app();
        let cookie = sign_in(&app, "karim@rideshare.tn", "karim123").await;

        let response = send(&app, post_form("/profile", "name=&bio=", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("Name is required"));

        let response = send(
            &app,
            post_form("/profile", "name=Karim+T.&bio=Coast+runs", Some(&cookie)),
        )
        .await;
        assert_eq!(location(&response), "/profile?notice=profile_updated");

        let html = body_text(send(&app, get("/profile?notice=profile_updated", Some(&cookie))).await).await;
        assert!(html.contains("Karim T."));
        assert!(html.contains("Coast runs"));
        assert!(html.contains("Profile updated."));
    }

    fn multipart(cookie: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"picture\"; filename=\"me.PNG\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::post("/profile/picture")
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn picture_upload() {
        let app = app();
        let cookie = sign_in(&app, "salma@rideshare.tn", "salma123").await;

        let response = send(&app, multipart(&cookie, "text/plain", b"hello")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("Only image files can be uploaded"));

        let response = send(&app, multipart(&cookie, "image/png", &[0x89, b'P', b'N', b'G'])).await;
        assert_eq!(location(&response), "/profile?notice=picture_updated");

        let html = body_text(send(&app, get("/profile", Some(&cookie))).await).await;
        assert!(html.contains("http://localhost:5000/uploads/"));
        assert!(html.contains(".png"));
    }

    #[tokio::test]
    async fn driver_page_lists_reviews() {
        let app = app();
        let response = send(&app, get("/driver/u-amira", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Amira Ben Salah"));
        assert!(html.contains("4.5"));
        assert!(html.contains("Karim Trabelsi"));
        assert!(html.contains("On time, smooth driving"));

        let response = send(&app, get("/driver/nobody", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
