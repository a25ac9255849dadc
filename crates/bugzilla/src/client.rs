//! Bugzilla client built on the XML-RPC transaction engine.
//!
//! The connection settings are an immutable value fixed at construction, and
//! authentication is an explicit [`Session`] token the caller threads through
//! each call. Nothing here holds hidden lazily-initialized state, so a client
//! shared across threads behaves like any other read-only value.

use std::collections::HashMap;

use tracing::debug;
use tracing::info;
use tracing::warn;

use xmlpack::Struct;
use xmlpack::Value;

use crate::error::Error;
use crate::error::Result;
use crate::model::text_of;
use crate::model::Bug;
use crate::model::Product;

/// Immutable connection settings for a Bugzilla server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Full URL of the XML-RPC endpoint, e.g. `https://host/xmlrpc.cgi`.
    pub base_url: String,
    pub user: String,
    pub password: String,
    /// Name of the field used to track releases, when searches should be
    /// scoped to one.
    pub release_field: Option<String>,
}

/// An authenticated conversation, created by [`Client::login`].
///
/// Servers since 4.4 hand back a token which each later call must carry;
/// older servers authenticate by cookie and return none.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    user_id: Option<i64>,
}

impl Session {
    /// A session with no credentials, for servers that allow anonymous reads.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }
}

/// A Bugzilla server handle.
pub struct Client {
    rpc: xmlrpc::Client,
    config: Config,
}

impl Client {
    /// Connects the client to the configured endpoint.
    pub fn connect(config: Config) -> Result<Self> {
        let rpc = xmlrpc::Client::open(config.base_url.clone())?;
        Ok(Self { rpc, config })
    }

    /// Builds a client over an existing engine. Used by tests.
    pub fn from_parts(rpc: xmlrpc::Client, config: Config) -> Self {
        Self { rpc, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Asks the server for its version, verifying it speaks the protocol.
    pub fn version(&self) -> Result<String> {
        let result = self.call_expect("Bugzilla.version", Struct::new())?;
        text_of(result.get("version")).ok_or(Error::MissingField {
            method: "Bugzilla.version",
            field: "version",
        })
    }

    /// Logs in with the configured credentials and returns the session the
    /// caller threads through subsequent calls.
    pub fn login(&self) -> Result<Session> {
        let mut args = Struct::new();
        args.insert("login".to_owned(), self.config.user.as_str().into());
        args.insert("password".to_owned(), self.config.password.as_str().into());
        args.insert("remember".to_owned(), Value::Bool(false));
        let result = self.call_expect("User.login", args)?;
        let session = Session {
            token: result
                .get("token")
                .and_then(Value::as_str)
                .map(str::to_owned),
            user_id: result.get("id").and_then(Value::as_i64),
        };
        info!(user = %self.config.user, "logged in");
        Ok(session)
    }

    /// Ends the session. Servers answer with an empty result.
    pub fn logout(&self, session: &Session) -> Result<()> {
        self.rpc.invoke("User.logout", &self.authed(session))?;
        info!(user = %self.config.user, "logged out");
        Ok(())
    }

    /// Searches bugs, optionally scoped to a product and to a release via
    /// the configured release field, and fills descriptions from the bugs'
    /// comments where the server exposes them.
    pub fn search(
        &self,
        session: &Session,
        release: Option<&str>,
        product: Option<&str>,
    ) -> Result<Vec<Bug>> {
        let mut args = self.authed(session);
        if let Some(product) = product {
            args.insert("product".to_owned(), product.into());
        }
        if let (Some(field), Some(release)) = (&self.config.release_field, release) {
            args.insert(field.clone(), release.into());
        }
        let result = self
            .rpc
            .invoke("Bug.search", &args)?
            .ok_or(Error::MethodUnavailable("Bug.search"))?;
        let found = result
            .get("bugs")
            .and_then(Value::as_array)
            .ok_or(Error::MissingField {
                method: "Bug.search",
                field: "bugs",
            })?;

        let ids: Vec<i64> = found
            .iter()
            .filter_map(|bug| bug.as_struct()?.get("id")?.as_i64())
            .collect();
        // Old servers lack Bug.comments; descriptions stay empty there.
        let comments = match self.comments(session, &ids) {
            Ok(comments) => comments,
            Err(err) => {
                warn!(%err, "could not fetch comments");
                HashMap::new()
            }
        };

        let mut bugs = Vec::with_capacity(found.len());
        for member in found {
            let members = member.as_struct().ok_or(Error::MissingField {
                method: "Bug.search",
                field: "bugs",
            })?;
            let mut bug = Bug::from_search(members, String::new(), release)?;
            if let Some(description) = comments.get(&bug.id) {
                bug.description = description.clone();
            }
            bugs.push(bug);
        }
        debug!(count = bugs.len(), "search finished");
        Ok(bugs)
    }

    /// Fetches each bug's comment texts, joined with newlines.
    pub fn comments(&self, session: &Session, ids: &[i64]) -> Result<HashMap<i64, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut args = self.authed(session);
        args.insert(
            "ids".to_owned(),
            Value::Array(ids.iter().map(|id| Value::Int(*id)).collect()),
        );
        let result = self.call_expect("Bug.comments", args)?;
        let per_bug = result
            .get("bugs")
            .and_then(Value::as_struct)
            .ok_or(Error::MissingField {
                method: "Bug.comments",
                field: "bugs",
            })?;

        let mut combined = HashMap::new();
        for (id, entry) in per_bug {
            let Ok(id) = id.parse::<i64>() else { continue };
            let texts: Vec<String> = entry
                .as_struct()
                .and_then(|members| members.get("comments"))
                .and_then(Value::as_array)
                .map(|comments| {
                    comments
                        .iter()
                        .filter_map(|comment| text_of(comment.as_struct()?.get("text")))
                        .filter(|text| !text.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            combined.insert(id, texts.join("\n"));
        }
        Ok(combined)
    }

    /// Lists the products the logged-in user may search.
    pub fn products(&self, session: &Session) -> Result<Vec<Product>> {
        let ids = self.call_expect("Product.get_accessible_products", self.authed(session))?;
        // Product.get takes the id list exactly as the previous call
        // returned it.
        let mut args = self.authed(session);
        for (name, value) in ids {
            args.insert(name, value);
        }
        let result = self.call_expect("Product.get", args)?;
        let products = result
            .get("products")
            .and_then(Value::as_array)
            .ok_or(Error::MissingField {
                method: "Product.get",
                field: "products",
            })?;
        Ok(products
            .iter()
            .filter_map(Value::as_struct)
            .map(Product::from_get)
            .collect())
    }

    /// Appends a comment to a bug. Empty text is a no-op, not a call.
    pub fn add_comment(&self, session: &Session, bug_id: i64, comment: &str) -> Result<()> {
        if comment.is_empty() {
            return Ok(());
        }
        let mut args = self.authed(session);
        args.insert("id".to_owned(), Value::Int(bug_id));
        args.insert("comment".to_owned(), comment.into());
        self.rpc.invoke("Bug.add_comment", &args)?;
        debug!(bug_id, "comment appended");
        Ok(())
    }

    /// Moves a bug to a new status. `Bug.update` addresses bugs through its
    /// `ids` list, so the target id always travels with the request.
    pub fn change_status(&self, session: &Session, bug_id: i64, status: &str) -> Result<()> {
        let mut args = self.authed(session);
        args.insert("ids".to_owned(), Value::Array(vec![Value::Int(bug_id)]));
        args.insert("status".to_owned(), status.into());
        self.rpc.invoke("Bug.update", &args)?;
        info!(bug_id, status, "status changed");
        Ok(())
    }

    /// Closes the given bug.
    pub fn close(&self, session: &Session, bug_id: i64) -> Result<()> {
        self.change_status(session, bug_id, "closed")
    }

    /// Web URL of a bug, derived from the endpoint URL.
    pub fn issue_url(&self, bug_id: i64) -> String {
        let base = self
            .config
            .base_url
            .rsplit_once('/')
            .map(|(head, _)| head)
            .unwrap_or(self.config.base_url.as_str());
        format!("{base}/show_bug.cgi?id={bug_id}")
    }

    /// Base arguments for an authenticated call.
    fn authed(&self, session: &Session) -> Struct {
        let mut args = Struct::new();
        if let Some(token) = session.token() {
            args.insert("Bugzilla_token".to_owned(), token.into());
        }
        args
    }

    /// Invokes a method whose result is required, mapping the no-result
    /// sentinel to `MethodUnavailable`.
    fn call_expect(&self, method: &'static str, args: Struct) -> Result<Struct> {
        self.rpc
            .invoke(method, &args)?
            .ok_or(Error::MethodUnavailable(method))
    }
}
