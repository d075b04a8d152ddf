use git2::{Cred, FetchOptions, RemoteCallbacks};
use url::form_urlencoded;

use crate::models::Credentials;

/// Fetch options authenticating with `credentials`, or anonymous when absent.
///
/// The token is form-encoded before it is handed to git2. libgit2 keeps
/// asking for credentials while the remote rejects them, so the second
/// request fails instead of looping.
pub fn fetch_options(credentials: Option<&Credentials>) -> FetchOptions<'static> {
    let mut options = FetchOptions::new();

    if let Some(credentials) = credentials {
        let username = credentials.username.clone();
        let password = encode_token(&credentials.token);
        let mut attempts = 0;

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, _username_from_url, _allowed_types| {
            attempts += 1;
            if attempts > 1 {
                return Err(git2::Error::from_str("remote rejected the supplied credentials"));
            }
            Cred::userpass_plaintext(&username, &password)
        });
        options.remote_callbacks(callbacks);
    }

    options
}

pub fn encode_token(token: &str) -> String {
    form_urlencoded::byte_serialize(token.as_bytes()).collect()
}
