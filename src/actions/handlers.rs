//! One handler per [`Action`]. Preconditions (privilege, required fields)
//! are already checked by the dispatcher when these run.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::error::{ActionError, FailureKind};
use super::fields::Fields;
use super::links;
use super::outcome::Outcome;
use super::registry::{Action, ENTRY_FIELDS};
use crate::auth::{Principal, Privilege, RequestContext, SessionBinder};
use crate::config::DatabaseConfig;
use crate::db::{BOOTSTRAP_ADMIN_NAME, EntryInput};
use crate::domain::{EntryId, UserId};
use crate::services::{
    CredentialError, CredentialStore, DatastoreAdmin, EntryStore, Setting, SettingsStore,
};

#[derive(Clone)]
pub struct Handlers {
    credentials: Arc<dyn CredentialStore>,
    entries: Arc<dyn EntryStore>,
    datastore: Arc<dyn DatastoreAdmin>,
    settings: Arc<dyn SettingsStore>,
    binder: SessionBinder,
}

impl Handlers {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        entries: Arc<dyn EntryStore>,
        datastore: Arc<dyn DatastoreAdmin>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let binder = SessionBinder::new(credentials.clone());
        Self {
            credentials,
            entries,
            datastore,
            settings,
            binder,
        }
    }

    #[must_use]
    pub const fn binder(&self) -> &SessionBinder {
        &self.binder
    }

    pub async fn execute(
        &self,
        action: Action,
        principal: &Principal,
        ctx: &RequestContext,
        fields: &Fields,
    ) -> Result<Outcome, ActionError> {
        match action {
            Action::UserAdd => self.user_add(fields).await,
            Action::UserUpdate => self.user_update(principal, fields).await,
            Action::UserDelete => self.user_delete(fields).await,
            Action::EntryAdd => self.entry_add(fields).await,
            Action::EntryUpdate => self.entry_update(fields).await,
            Action::EntryDelete => self.entry_delete(fields).await,
            Action::Login => self.login(ctx, fields).await,
            Action::Logout => self.logout(ctx).await,
            Action::Password => self.password(principal, fields).await,
            Action::Datastore => self.datastore(principal, ctx, fields).await,
            Action::Settings => self.settings(fields).await,
            Action::Account => self.account(fields).await,
        }
    }

    // ========================================================================
    // Users
    // ========================================================================

    async fn user_add(&self, fields: &Fields) -> Result<Outcome, ActionError> {
        let name = field(fields, "name");
        let password = field(fields, "password");
        let role = Privilege::from_str(field(fields, "role"))
            .map_err(|_| ActionError::Failed(FailureKind::Add))?;

        let id = self
            .credentials
            .create(name, password, role)
            .await
            .map_err(|e| match e {
                CredentialError::Validation(_) => ActionError::Failed(FailureKind::Add),
                other => other.into(),
            })?;

        info!(user_id = %id, %role, "User added");
        Ok(Outcome::Created(id.value()))
    }

    /// Applies `name`, `password` and `role` in the order they were
    /// submitted. Stops at the first failure; earlier changes stay applied.
    async fn user_update(
        &self,
        principal: &Principal,
        fields: &Fields,
    ) -> Result<Outcome, ActionError> {
        let id = parse_user_id(field(fields, "id"))?;
        if self.credentials.find_by_id(id).await?.is_none() {
            return Err(ActionError::InvalidId(id.to_string()));
        }

        let mut credentials_changed = false;
        for (key, value) in fields.iter() {
            let applied = match key {
                "name" => self.credentials.update_name(id, value).await,
                "password" => self.credentials.update_password(id, value).await,
                "role" => match Privilege::from_str(value) {
                    Ok(role) => self.credentials.update_privilege(id, role).await,
                    Err(e) => Err(CredentialError::Validation(e.to_string())),
                },
                _ => continue,
            };

            if let Err(e) = applied {
                warn!(user_id = %id, field = key, error = %e, "User update stopped");
                self.end_foreign_session(principal, id, credentials_changed)
                    .await?;
                return Err(ActionError::Failed(FailureKind::Update));
            }
            credentials_changed |= matches!(key, "password" | "role");
        }

        self.end_foreign_session(principal, id, credentials_changed)
            .await?;
        info!(user_id = %id, "User updated");
        Ok(Outcome::UPDATED)
    }

    /// Logs the target out after an admin changed their password or role.
    /// The acting admin keeps their own session.
    async fn end_foreign_session(
        &self,
        principal: &Principal,
        id: UserId,
        credentials_changed: bool,
    ) -> Result<(), ActionError> {
        if credentials_changed && principal.user_id() != Some(id) {
            self.credentials.clear_session(id).await?;
            info!(user_id = %id, "Session ended after credential change");
        }
        Ok(())
    }

    async fn user_delete(&self, fields: &Fields) -> Result<Outcome, ActionError> {
        let id = parse_user_id(field(fields, "id"))?;
        if !self.credentials.delete(id).await? {
            return Err(ActionError::InvalidId(id.to_string()));
        }

        info!(user_id = %id, "User deleted");
        Ok(Outcome::DELETED)
    }

    // ========================================================================
    // Entries
    // ========================================================================

    async fn entry_add(&self, fields: &Fields) -> Result<Outcome, ActionError> {
        let id = self.entries.add(entry_input(fields)).await?;

        info!(entry_id = %id, "Entry added");
        Ok(Outcome::Created(id.value()))
    }

    async fn entry_update(&self, fields: &Fields) -> Result<Outcome, ActionError> {
        let id = parse_entry_id(field(fields, "id"))?;
        if !self.entries.update(id, entry_input(fields)).await? {
            return Err(ActionError::InvalidId(id.to_string()));
        }

        info!(entry_id = %id, "Entry updated");
        Ok(Outcome::UPDATED)
    }

    async fn entry_delete(&self, fields: &Fields) -> Result<Outcome, ActionError> {
        let id = parse_entry_id(field(fields, "id"))?;
        if !self.entries.delete(id).await? {
            return Err(ActionError::InvalidId(id.to_string()));
        }

        info!(entry_id = %id, "Entry deleted");
        Ok(Outcome::DELETED)
    }

    // ========================================================================
    // Session
    // ========================================================================

    async fn login(&self, ctx: &RequestContext, fields: &Fields) -> Result<Outcome, ActionError> {
        let name = field(fields, "name");
        let password = field(fields, "pwd");

        self.binder.login(name, password, ctx).await?;

        let target = ctx
            .continue_to
            .clone()
            .unwrap_or_else(|| links::INDEX.to_string());
        Ok(Outcome::Redirect(target))
    }

    async fn logout(&self, ctx: &RequestContext) -> Result<Outcome, ActionError> {
        self.binder.logout(ctx).await?;
        Ok(Outcome::Redirect(links::INDEX.to_string()))
    }

    async fn password(
        &self,
        principal: &Principal,
        fields: &Fields,
    ) -> Result<Outcome, ActionError> {
        let Some(id) = principal.user_id() else {
            return Err(ActionError::Forbidden(Action::Password.name()));
        };

        if !self
            .credentials
            .verify_password(id, field(fields, "oldpwd"))
            .await?
        {
            return Err(ActionError::WrongPassword);
        }

        self.credentials
            .update_password(id, field(fields, "newpwd"))
            .await
            .map_err(|e| match e {
                CredentialError::Validation(_) | CredentialError::NotFound(_) => {
                    ActionError::Failed(FailureKind::Password)
                }
                other => other.into(),
            })?;

        info!(user_id = %id, "Password changed");
        Ok(Outcome::UPDATED)
    }

    // ========================================================================
    // Setup & administration
    // ========================================================================

    /// Probes the new datastore before anything is persisted. A failed probe
    /// sends the admin back to the form with the reason attached.
    ///
    /// In setup mode the target is then initialised and becomes the live
    /// store; the caller's session moves along so the wizard can continue.
    async fn datastore(
        &self,
        principal: &Principal,
        ctx: &RequestContext,
        fields: &Fields,
    ) -> Result<Outcome, ActionError> {
        let target = DatabaseConfig {
            host: field(fields, "host").trim().to_string(),
            base: field(fields, "base").trim().to_string(),
            user: field(fields, "user").to_string(),
            pass: field(fields, "pass").to_string(),
        };

        if let Err(e) = self.datastore.check(&target).await {
            warn!(host = %target.host, error = ?e, "Datastore probe failed");
            return Ok(Outcome::Redirect(links::datastore_error(&e.to_string())));
        }

        let previous = self.settings.snapshot().await;
        let setup_mode = previous.general.setup_mode;

        // Read from the old store, the account may not exist in the new one
        let wizard = match principal.user_id() {
            Some(id) if setup_mode => self.credentials.find_by_id(id).await?.map(|u| u.name),
            _ => None,
        };

        self.persist_datastore(&target).await?;

        if setup_mode {
            if let Err(e) = self.datastore.initialize(&target).await {
                warn!(host = %target.host, error = ?e, "Datastore initialisation failed");
                if let Err(revert) = self.persist_datastore(&previous.database).await {
                    error!(
                        host = %target.host,
                        error = %revert,
                        "Config names a datastore that was never initialised"
                    );
                }
                return Ok(Outcome::Redirect(links::datastore_error(&e.to_string())));
            }

            self.carry_session(wizard.as_deref(), ctx).await?;
        }

        info!(host = %target.host, base = %target.base, "Datastore configured");
        let next = if setup_mode { "settings" } else { "mysql" };
        Ok(Outcome::Redirect(links::page(next)))
    }

    async fn persist_datastore(&self, target: &DatabaseConfig) -> Result<(), ActionError> {
        self.settings
            .apply(&[
                (Setting::DatabaseHost, target.host.as_str()),
                (Setting::DatabaseBase, target.base.as_str()),
                (Setting::DatabaseUser, target.user.as_str()),
                (Setting::DatabasePass, target.pass.as_str()),
            ])
            .await?;
        Ok(())
    }

    /// Binds the current token and address to the wizard's account in the
    /// live store, or to the seeded admin when that account is not there.
    async fn carry_session(
        &self,
        wizard: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<(), ActionError> {
        let mut account = None;
        for name in wizard.into_iter().chain([BOOTSTRAP_ADMIN_NAME]) {
            account = self.credentials.find_by_name(name).await?;
            if account.is_some() {
                break;
            }
        }

        let Some(user) = account else {
            warn!("No admin account in the new datastore, session not carried over");
            return Ok(());
        };

        self.credentials
            .set_session(user.id, &ctx.token, ctx.address)
            .await?;
        info!(user_id = %user.id, "Session carried over to new datastore");
        Ok(())
    }

    async fn settings(&self, fields: &Fields) -> Result<Outcome, ActionError> {
        self.settings
            .apply(&[
                (Setting::Debug, field(fields, "debug")),
                (Setting::DeleteOlderThanDays, field(fields, "delold")),
                (Setting::SkipWeekends, field(fields, "skipweekends")),
                (Setting::DefaultPrivilege, field(fields, "privdefault")),
            ])
            .await?;

        let setup_mode = self.settings.snapshot().await.general.setup_mode;
        let next = if setup_mode { "account" } else { "settings" };
        Ok(Outcome::Redirect(links::page(next)))
    }

    /// Sets the password of the named account, creating it as an admin if
    /// it does not exist. Finishes the setup wizard.
    async fn account(&self, fields: &Fields) -> Result<Outcome, ActionError> {
        let name = field(fields, "name").trim();
        let password = field(fields, "pwd");
        if name.is_empty() || password.is_empty() {
            return Err(ActionError::IncompleteData(
                Action::Account.required_fields().to_vec(),
            ));
        }

        if let Some(user) = self.credentials.find_by_name(name).await? {
            self.credentials
                .update_password(user.id, password)
                .await
                .map_err(|e| match e {
                    CredentialError::Database(msg) => ActionError::Store(msg),
                    _ => ActionError::Failed(FailureKind::Password),
                })?;
            info!(user_id = %user.id, "Account password set");
        } else {
            let id = self
                .credentials
                .create(name, password, Privilege::Admin)
                .await
                .map_err(|e| match e {
                    CredentialError::Database(msg) => ActionError::Store(msg),
                    CredentialError::Duplicate => ActionError::Duplicate,
                    _ => ActionError::Failed(FailureKind::Add),
                })?;
            info!(user_id = %id, "Admin account created");
        }

        if self.settings.snapshot().await.general.setup_mode {
            self.settings.apply(&[(Setting::SetupMode, "0")]).await?;
            info!("Setup finished");
            return Ok(Outcome::Redirect(links::page("final")));
        }

        Ok(Outcome::Redirect(links::page("account")))
    }
}

/// Value of a field the dispatcher has already checked for; absent optional
/// fields read as empty.
fn field<'a>(fields: &'a Fields, key: &str) -> &'a str {
    fields.get(key).unwrap_or_default()
}

fn parse_user_id(raw: &str) -> Result<UserId, ActionError> {
    UserId::from_str(raw).map_err(|_| ActionError::InvalidId(raw.to_string()))
}

fn parse_entry_id(raw: &str) -> Result<EntryId, ActionError> {
    EntryId::from_str(raw).map_err(|_| ActionError::InvalidId(raw.to_string()))
}

fn entry_input(fields: &Fields) -> EntryInput {
    let [time, teacher, course, subject, duration, sub, change, oldroom, newroom] =
        ENTRY_FIELDS.map(|key| field(fields, key).to_string());

    EntryInput {
        time,
        teacher,
        course,
        subject,
        duration,
        sub,
        change,
        oldroom,
        newroom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::{Harness, entry_fields};
    use crate::auth::BoundAddress;
    use crate::entities::entries;

    fn admin(h: &Harness) -> Principal {
        Principal::Authenticated {
            user_id: h.admin_id,
            privilege: Privilege::Admin,
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new("tok", BoundAddress::V4(0x7f00_0001))
    }

    fn columns(entry: &entries::Model) -> [Option<&str>; 9] {
        [
            &entry.time,
            &entry.teacher,
            &entry.course,
            &entry.subject,
            &entry.duration,
            &entry.sub,
            &entry.change,
            &entry.oldroom,
            &entry.newroom,
        ]
        .map(Option::as_deref)
    }

    /// Collects `level message field=value` lines from events on this thread.
    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Captured {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            struct Line(String);

            impl tracing::field::Visit for Line {
                fn record_debug(
                    &mut self,
                    field: &tracing::field::Field,
                    value: &dyn std::fmt::Debug,
                ) {
                    if field.name() == "message" {
                        self.0.push_str(&format!(" {value:?}"));
                    } else {
                        self.0.push_str(&format!(" {}={value:?}", field.name()));
                    }
                }
            }

            let mut line = Line(event.metadata().level().to_string());
            event.record(&mut line);
            self.0.lock().unwrap().push(line.0);
        }
    }

    #[tokio::test]
    async fn added_entries_are_logged_with_their_id() {
        use tracing_subscriber::layer::SubscriberExt;

        let h = Harness::new().await;
        let captured = Captured::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(captured.clone()));

        let Outcome::Created(id) = h
            .handlers
            .execute(Action::EntryAdd, &admin(&h), &ctx(), &entry_fields(None))
            .await
            .unwrap()
        else {
            panic!("expected an id");
        };

        let lines = captured.0.lock().unwrap();
        assert!(
            lines
                .iter()
                .any(|l| l == &format!("INFO Entry added entry_id={id}")),
            "{lines:?}"
        );
    }

    #[tokio::test]
    async fn entry_round_trip() {
        let h = Harness::new().await;
        let p = admin(&h);

        let Outcome::Created(id) = h
            .handlers
            .execute(Action::EntryAdd, &p, &ctx(), &entry_fields(None))
            .await
            .unwrap()
        else {
            panic!("expected an id");
        };

        let stored = h.entries.get(EntryId::new(id)).await.unwrap().unwrap();
        assert_eq!(
            columns(&stored),
            ["2", "Hu", "7a", "De", "1", "Ro", "Vertretung", "A 1.02", "B 2.14"].map(Some)
        );

        let id_text = id.to_string();
        let changed: Fields = [
            ("id", id_text.as_str()),
            ("time", "5"),
            ("teacher", "Kr"),
            ("course", "9c"),
            ("subject", "Bio"),
            ("duration", "2"),
            ("sub", "---"),
            ("change", "Entfall"),
            ("oldroom", "C 0.11"),
            ("newroom", "Turnhalle"),
        ]
        .into_iter()
        .collect();
        let outcome = h
            .handlers
            .execute(Action::EntryUpdate, &p, &ctx(), &changed)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::UPDATED);

        let stored = h.entries.get(EntryId::new(id)).await.unwrap().unwrap();
        assert_eq!(
            columns(&stored),
            ["5", "Kr", "9c", "Bio", "2", "---", "Entfall", "C 0.11", "Turnhalle"].map(Some)
        );

        let delete: Fields = [("id", id.to_string())].into_iter().collect();
        assert_eq!(
            h.handlers
                .execute(Action::EntryDelete, &p, &ctx(), &delete)
                .await
                .unwrap(),
            Outcome::DELETED
        );
        assert!(matches!(
            h.handlers
                .execute(Action::EntryDelete, &p, &ctx(), &delete)
                .await,
            Err(ActionError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn non_numeric_ids_are_invalid() {
        let h = Harness::new().await;
        for action in [Action::UserDelete, Action::EntryDelete, Action::UserUpdate] {
            let fields: Fields = [("id", "abc")].into_iter().collect();
            assert!(matches!(
                h.handlers.execute(action, &admin(&h), &ctx(), &fields).await,
                Err(ActionError::InvalidId(_))
            ));
        }
    }

    #[tokio::test]
    async fn user_add_reports_duplicates_and_bad_roles() {
        let h = Harness::new().await;
        let add = |name: &str, role: &str| -> Fields {
            [("name", name), ("password", "pw"), ("role", role)]
                .into_iter()
                .collect()
        };

        let outcome = h
            .handlers
            .execute(Action::UserAdd, &admin(&h), &ctx(), &add("schueler", "1"))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Created(_)));

        assert!(matches!(
            h.handlers
                .execute(Action::UserAdd, &admin(&h), &ctx(), &add("schueler", "1"))
                .await,
            Err(ActionError::Duplicate)
        ));
        assert!(matches!(
            h.handlers
                .execute(Action::UserAdd, &admin(&h), &ctx(), &add("neu", "9"))
                .await,
            Err(ActionError::Failed(FailureKind::Add))
        ));
    }

    #[tokio::test]
    async fn user_update_applies_in_order_and_stops_at_first_failure() {
        let h = Harness::new().await;
        let id = h
            .credentials
            .create("alt", "pw", Privilege::ViewBasic)
            .await
            .unwrap();

        let fields: Fields = [
            ("id", id.to_string().as_str()),
            ("role", "3"),
            ("name", "admin"),
            ("password", "never-applied"),
        ]
        .into_iter()
        .collect();

        let result = h
            .handlers
            .execute(Action::UserUpdate, &admin(&h), &ctx(), &fields)
            .await;
        assert!(matches!(result, Err(ActionError::Failed(FailureKind::Update))));

        let user = h.credentials.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.privilege, Privilege::Edit);
        assert_eq!(user.name, "alt");
        assert!(h.credentials.verify_password(id, "pw").await.unwrap());
    }

    #[tokio::test]
    async fn admin_credential_changes_end_the_target_session() {
        let h = Harness::new().await;
        let id = h
            .credentials
            .create("lehrer", "pw", Privilege::ViewAll)
            .await
            .unwrap();
        let elsewhere = BoundAddress::V4(0x0a00_0042);
        h.credentials.set_session(id, "theirs", elsewhere).await.unwrap();
        h.credentials
            .set_session(h.admin_id, "tok", BoundAddress::V4(0x7f00_0001))
            .await
            .unwrap();

        // A rename alone keeps the target logged in
        let id_text = id.to_string();
        let rename: Fields = [("id", id_text.as_str()), ("name", "lehrerin")]
            .into_iter()
            .collect();
        h.handlers
            .execute(Action::UserUpdate, &admin(&h), &ctx(), &rename)
            .await
            .unwrap();
        assert!(h.credentials.find_by_session("theirs").await.unwrap().is_some());

        let demote: Fields = [("id", id_text.as_str()), ("role", "1")]
            .into_iter()
            .collect();
        h.handlers
            .execute(Action::UserUpdate, &admin(&h), &ctx(), &demote)
            .await
            .unwrap();
        assert!(h.credentials.find_by_session("theirs").await.unwrap().is_none());

        // Changing one's own password through user.update keeps the session
        let own_id = h.admin_id.to_string();
        let own: Fields = [("id", own_id.as_str()), ("password", "neu")]
            .into_iter()
            .collect();
        h.handlers
            .execute(Action::UserUpdate, &admin(&h), &ctx(), &own)
            .await
            .unwrap();
        let me = h.credentials.find_by_session("tok").await.unwrap().unwrap();
        assert_eq!(me.id, h.admin_id);
    }

    #[tokio::test]
    async fn password_change_checks_old_password() {
        let h = Harness::new().await;
        let p = admin(&h);
        let change = |old: &str, new: &str| -> Fields {
            [("oldpwd", old), ("newpwd", new)].into_iter().collect()
        };

        assert!(matches!(
            h.handlers
                .execute(Action::Password, &p, &ctx(), &change("falsch", "neu"))
                .await,
            Err(ActionError::WrongPassword)
        ));
        assert!(matches!(
            h.handlers
                .execute(Action::Password, &p, &ctx(), &change(Harness::ADMIN_PASSWORD, ""))
                .await,
            Err(ActionError::Failed(FailureKind::Password))
        ));
        assert_eq!(
            h.handlers
                .execute(Action::Password, &p, &ctx(), &change(Harness::ADMIN_PASSWORD, "neu"))
                .await
                .unwrap(),
            Outcome::UPDATED
        );
        assert!(h.credentials.verify_password(h.admin_id, "neu").await.unwrap());
    }

    #[tokio::test]
    async fn login_redirects_to_sanitised_continue() {
        let h = Harness::new().await;
        let mut c = ctx();
        c.continue_to = Some("/?source=edit".to_string());
        let fields: Fields = [("name", "admin"), ("pwd", Harness::ADMIN_PASSWORD)]
            .into_iter()
            .collect();

        let outcome = h
            .handlers
            .execute(Action::Login, &Principal::Anonymous, &c, &fields)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Redirect("/?source=edit".to_string()));

        let missing: Fields = [("name", "admin")].into_iter().collect();
        assert!(matches!(
            h.handlers
                .execute(Action::Login, &Principal::Anonymous, &c, &missing)
                .await,
            Err(ActionError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn unreachable_datastore_redirects_with_error_and_persists_nothing() {
        let h = Harness::with_datastore(false).await;
        let fields: Fields = [
            ("host", "db.invalid"),
            ("base", "plan"),
            ("user", "u"),
            ("pass", "p"),
        ]
        .into_iter()
        .collect();

        let outcome = h
            .handlers
            .execute(Action::Datastore, &admin(&h), &ctx(), &fields)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Redirect(
                "/?source=mysql&error=could%20not%20connect%20to%20database%20server".to_string()
            )
        );
        assert_ne!(h.settings.snapshot().await.database.host, "db.invalid");
    }

    #[tokio::test]
    async fn setup_wizard_walks_through_all_steps() {
        let h = Harness::with_datastore(true).await;
        h.settings.apply(&[(Setting::SetupMode, "1")]).await.unwrap();
        let p = admin(&h);

        let datastore: Fields = [
            ("host", "db.local"),
            ("base", "plan"),
            ("user", "u"),
            ("pass", "p"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            h.handlers
                .execute(Action::Datastore, &p, &ctx(), &datastore)
                .await
                .unwrap(),
            Outcome::Redirect("/?source=settings".to_string())
        );
        assert_eq!(h.datastore_initializations(), 1);
        assert_eq!(h.settings.snapshot().await.database.host, "db.local");
        let bound = h.credentials.find_by_session("tok").await.unwrap().unwrap();
        assert_eq!(bound.id, h.admin_id);

        let settings: Fields = [
            ("debug", "0"),
            ("delold", "7"),
            ("skipweekends", "1"),
            ("privdefault", "1"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            h.handlers
                .execute(Action::Settings, &p, &ctx(), &settings)
                .await
                .unwrap(),
            Outcome::Redirect("/?source=account".to_string())
        );

        let account: Fields = [("name", "chef"), ("pwd", "sicher")].into_iter().collect();
        assert_eq!(
            h.handlers
                .execute(Action::Account, &p, &ctx(), &account)
                .await
                .unwrap(),
            Outcome::Redirect("/?source=final".to_string())
        );

        let config = h.settings.snapshot().await;
        assert!(!config.general.setup_mode);
        assert_eq!(config.database.host, "db.local");
        assert_eq!(config.board.delete_older_than_days, 7);
        let chef = h.credentials.find_by_name("chef").await.unwrap().unwrap();
        assert_eq!(chef.privilege, Privilege::Admin);
    }

    #[tokio::test]
    async fn failed_initialisation_restores_previous_datastore() {
        let h = Harness::with_failing_initialization().await;
        h.settings.apply(&[(Setting::SetupMode, "1")]).await.unwrap();
        let before = h.settings.snapshot().await.database;

        let fields: Fields = [
            ("host", "db.local"),
            ("base", "plan"),
            ("user", "u"),
            ("pass", "p"),
        ]
        .into_iter()
        .collect();
        let outcome = h
            .handlers
            .execute(Action::Datastore, &admin(&h), &ctx(), &fields)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Redirect(
                "/?source=mysql&error=could%20not%20initialise%20database%3A%20table%20creation%20denied"
                    .to_string()
            )
        );
        assert_eq!(h.datastore_initializations(), 1);
        let after = h.settings.snapshot().await;
        assert_eq!(after.database.host, before.host);
        assert_eq!(after.database.base, before.base);
        assert!(after.general.setup_mode);
        assert!(h.credentials.find_by_session("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn settings_rejects_unparsable_values() {
        let h = Harness::new().await;
        let settings: Fields = [
            ("debug", "0"),
            ("delold", "bald"),
            ("skipweekends", "1"),
            ("privdefault", "1"),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            h.handlers
                .execute(Action::Settings, &admin(&h), &ctx(), &settings)
                .await,
            Err(ActionError::InvalidValue(_))
        ));
    }
}
