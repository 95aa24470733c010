//! Main application state and async plumbing.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use eframe::egui::{self, Align, Layout};
use egui_phosphor::regular::{GEAR, SIGN_OUT, USER};
use tokio::sync::mpsc;

use crate::api::analytics::PatientHistory;
use crate::api::{self, ApiClient, analytics, auth, billing, images, medical_staff, patients, scan_appointments};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::export;
use crate::models::{
    BillingAccount, Charge, CreateBillingAccount, Diagnosis, MedicalImage, MedicalRecord, MedicalStaff, Patient,
    Report, ScanAppointment, ScanStatus,
};
use crate::routing::{Panel, Role, Route, can_open, resolve_home};
use crate::search;
use crate::session::Session;

use super::components::{colors, loading_spinner};
use super::forms::{
    ChargeForm, DiagnosisForm, LoginForm, PatientForm, RecordForm, ReportForm, ScanRequestForm, ScheduleForm,
    StaffForm, UploadForm,
};
use super::toast::Toasts;
use super::{
    billing_panel, dashboard, image_review_panel, login, patient_records_panel, profile_panel, reports_panel,
    scan_panel, settings_panel, staff_panel,
};

/// The signed-in user's own patient or staff record.
#[derive(Debug, Clone)]
pub enum Profile {
    Patient(Patient),
    Staff(MedicalStaff),
}

/// A patient's billing account with its charges.
#[derive(Debug, Clone)]
pub struct Statement {
    pub patient_id: i64,
    pub account: BillingAccount,
    pub charges: Vec<Charge>,
}

/// Patient history with each section loaded independently.
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub patient_id: i64,
    pub records: Result<Vec<MedicalRecord>, String>,
    pub diagnoses: Result<Vec<Diagnosis>, String>,
    pub reports: Result<Vec<Report>, String>,
}

impl HistoryView {
    fn from_history(patient_id: i64, history: PatientHistory) -> Self {
        Self {
            patient_id,
            records: history.records.map_err(|e| e.user_message()),
            diagnoses: history.diagnoses.map_err(|e| e.user_message()),
            reports: history.reports.map_err(|e| e.user_message()),
        }
    }
}

/// What to refresh after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    Nothing,
    Patients,
    Staff,
    Images,
    Reports,
    Appointments,
    History(i64),
    Statement(i64),
    Profile,
}

/// The dialog a write came from; it closes only once that write succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Patient,
    Staff,
    Record,
    Diagnosis,
    Report,
    Upload,
    ScanRequest,
    Schedule,
    Charge,
}

/// Messages from async tasks to UI.
pub enum UiMessage {
    // Session
    LoggedIn(Session),
    LoginFailed(String),

    // Data loading
    PatientsLoaded(Vec<Patient>),
    StaffLoaded(Vec<MedicalStaff>),
    ImagesLoaded(Vec<MedicalImage>),
    ReportsLoaded(Vec<Report>),
    AppointmentsLoaded(Vec<ScanAppointment>),
    UnassignedLoaded(Vec<ScanAppointment>),
    HistoryLoaded(i64, PatientHistory),
    StatementLoaded(Statement),
    StatementMissing(i64),
    ProfileLoaded(Profile),

    // Writes
    Saved(String, Reload, Option<FormKind>),
    Failed(String, AppError),

    // Settings
    ConnectionTested(Result<(), String>),
}

/// Log level for UI messages.
#[derive(Clone, Copy, Debug)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Log entry for display in the UI.
#[derive(Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub level: LogLevel,
}

/// Target for delete confirmation dialog.
#[derive(Clone)]
pub enum DeleteTarget {
    Patient(i64, String),
    Staff(i64, String),
    Image(i64, String),
    Report(i64, String),
    Appointment(i64, String),
}

/// Main application state.
pub struct App {
    // Runtime and backend
    pub rt: tokio::runtime::Runtime,
    pub api: ApiClient,
    ctx: egui::Context,
    busy: Arc<AtomicUsize>,

    // Message channel for async communication
    pub tx: mpsc::UnboundedSender<UiMessage>,
    pub rx: mpsc::UnboundedReceiver<UiMessage>,

    // Navigation
    pub current_panel: Panel,

    // Cached data
    pub patients: Vec<Patient>,
    pub staff: Vec<MedicalStaff>,
    pub images: Vec<MedicalImage>,
    pub reports: Vec<Report>,
    pub appointments: Vec<ScanAppointment>,
    pub unassigned: Vec<ScanAppointment>,
    pub history: Option<HistoryView>,
    pub statement: Option<Statement>,
    pub missing_statement: Option<i64>,
    pub profile: Option<Profile>,

    // Selection
    pub selected_patient: Option<i64>,
    pub selected_report: Option<i64>,
    pub billing_patient: Option<i64>,

    // Forms
    pub login_form: LoginForm,
    pub patient_form: PatientForm,
    pub staff_form: StaffForm,
    pub scan_form: ScanRequestForm,
    pub schedule_form: ScheduleForm,
    pub record_form: RecordForm,
    pub diagnosis_form: DiagnosisForm,
    pub report_form: ReportForm,
    pub charge_form: ChargeForm,
    pub upload_form: UploadForm,

    // Search/filter state
    pub patient_search: String,
    pub image_search: String,
    pub staff_search: String,
    pub staff_role_filter: Option<Role>,
    pub appointment_status_filter: Option<ScanStatus>,

    // Notifications
    pub toasts: Toasts,
    pub log_messages: Vec<LogEntry>,

    // Configuration
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub config_modified: bool,
    pub connection_test: Option<Result<(), String>>,
    pub connection_testing: bool,

    // Dialogs
    pub show_delete_confirm: bool,
    pub delete_target: Option<DeleteTarget>,
}

impl App {
    pub fn new(
        ctx: egui::Context,
        api: ApiClient,
        config: AppConfig,
        config_path: PathBuf,
        rt: tokio::runtime::Runtime,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let toasts = Toasts::new(Duration::from_millis(config.ui.toast_duration_ms));

        let mut app = Self {
            rt,
            api,
            ctx,
            busy: Arc::new(AtomicUsize::new(0)),
            tx,
            rx,
            current_panel: Panel::default(),
            patients: Vec::new(),
            staff: Vec::new(),
            images: Vec::new(),
            reports: Vec::new(),
            appointments: Vec::new(),
            unassigned: Vec::new(),
            history: None,
            statement: None,
            missing_statement: None,
            profile: None,
            selected_patient: None,
            selected_report: None,
            billing_patient: None,
            login_form: LoginForm::default(),
            patient_form: PatientForm::default(),
            staff_form: StaffForm::default(),
            scan_form: ScanRequestForm::default(),
            schedule_form: ScheduleForm::default(),
            record_form: RecordForm::default(),
            diagnosis_form: DiagnosisForm::default(),
            report_form: ReportForm::default(),
            charge_form: ChargeForm::default(),
            upload_form: UploadForm::default(),
            patient_search: String::new(),
            image_search: String::new(),
            staff_search: String::new(),
            staff_role_filter: None,
            appointment_status_filter: None,
            toasts,
            log_messages: Vec::new(),
            config,
            config_path,
            config_modified: false,
            connection_test: None,
            connection_testing: false,
            show_delete_confirm: false,
            delete_target: None,
        };

        // Restored session: load the dashboard straight away
        if let Some(session) = app.session() {
            app.log_info(format!("Restored session for {}", session.username));
            app.load_dashboard_data();
        }

        app
    }

    pub fn session(&self) -> Option<Session> {
        self.api.session().current()
    }

    pub fn role(&self) -> Option<Role> {
        self.api.session().role()
    }

    /// Patient or staff id of the signed-in user.
    pub fn profile_id(&self) -> Option<i64> {
        self.session().and_then(|s| s.profile_id)
    }

    pub fn is_loading(&self) -> bool {
        self.busy.load(Ordering::SeqCst) > 0
    }

    /// Log a message to the UI log.
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.log_messages.push(LogEntry {
            timestamp: Local::now(),
            message: message.into(),
            level,
        });

        // Keep only last 100 messages
        if self.log_messages.len() > 100 {
            self.log_messages.remove(0);
        }
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn log_success(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Success, message);
    }

    pub fn log_warning(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Clear the activity log.
    pub fn clear_log(&mut self) {
        self.log_messages.clear();
    }

    /// Show an error as a toast and in the activity log.
    pub fn notify_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.toasts.error(message.clone());
        self.log_error(message);
    }

    pub fn notify_success(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.toasts.success(message.clone());
        self.log_success(message);
    }

    /// Run `task` on the runtime. The busy counter drives the spinner.
    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(ApiClient, mpsc::UnboundedSender<UiMessage>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let busy = Arc::clone(&self.busy);
        let ctx = self.ctx.clone();
        busy.fetch_add(1, Ordering::SeqCst);

        let fut = task(self.api.clone(), self.tx.clone());
        self.rt.spawn(async move {
            fut.await;
            busy.fetch_sub(1, Ordering::SeqCst);
            ctx.request_repaint();
        });
    }

    /// Spawn a write and report it as `Saved(message, reload)` on success.
    fn spawn_write<F, Fut, T>(&self, context: &str, message: String, reload: Reload, task: F)
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = crate::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.spawn_saving(None, context, message, reload, task);
    }

    /// Like [`Self::spawn_write`], closing `form` when the write succeeds.
    /// On failure the form stays open with the user's input.
    fn spawn_form_write<F, Fut, T>(&self, form: FormKind, context: &str, message: String, reload: Reload, task: F)
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = crate::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.spawn_saving(Some(form), context, message, reload, task);
    }

    fn spawn_saving<F, Fut, T>(&self, form: Option<FormKind>, context: &str, message: String, reload: Reload, task: F)
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = crate::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let context = context.to_string();
        self.spawn(move |api, tx| {
            let fut = task(api);
            async move {
                let msg = match fut.await {
                    Ok(_) => UiMessage::Saved(message, reload, form),
                    Err(e) => UiMessage::Failed(context, e),
                };
                let _ = tx.send(msg);
            }
        });
    }

    /// Reset the dialog a successful write came from.
    fn close_form(&mut self, form: FormKind) {
        match form {
            FormKind::Patient => self.patient_form.reset(),
            FormKind::Staff => self.staff_form.reset(),
            FormKind::Record => self.record_form.reset(),
            FormKind::Diagnosis => self.diagnosis_form.reset(),
            FormKind::Report => self.report_form.reset(),
            FormKind::Upload => self.upload_form.reset(),
            FormKind::ScanRequest => self.scan_form.reset(),
            FormKind::Schedule => self.schedule_form.reset(),
            FormKind::Charge => self.charge_form.reset(),
        }
    }

    // ---- Navigation ----

    /// Switch panel, loading whatever it shows.
    pub fn open_panel(&mut self, panel: Panel) {
        let Some(role) = self.role() else {
            return;
        };
        if !can_open(role, panel) {
            self.notify_error(format!("{} is not available for {}", panel.name(), role.label()));
            return;
        }

        self.current_panel = panel;
        match panel {
            Panel::Dashboard => self.load_dashboard_data(),
            Panel::Profile => self.load_profile(),
            Panel::PatientRecords => {
                self.load_patients();
                self.load_staff_names();
            }
            Panel::ImageReview => self.load_images(),
            Panel::Reports => {
                self.load_reports();
                self.load_staff_names();
            }
            Panel::Billing => {
                if role == Role::Patient {
                    if let Some(id) = self.profile_id() {
                        self.load_statement(id);
                    }
                } else {
                    self.load_patients();
                }
            }
            Panel::ScanAppointments => {
                self.load_appointments();
                self.load_staff_names();
                if role.is_staff() {
                    self.load_patients();
                }
            }
            Panel::Staff => self.load_staff(),
            Panel::Settings => {}
        }
    }

    /// Data shown on the role's dashboard.
    pub fn load_dashboard_data(&mut self) {
        let Some(role) = self.role() else {
            return;
        };
        self.load_profile();
        self.load_appointments();
        match role {
            Role::Patient => {
                if let Some(id) = self.profile_id() {
                    self.load_statement(id);
                }
            }
            Role::Doctor => self.load_patients(),
            Role::Radiologist => self.load_images(),
            Role::Admin => {
                self.load_patients();
                self.load_staff();
            }
        }
    }

    // ---- Session ----

    pub fn login(&mut self) {
        if let Err(e) = self.login_form.validate() {
            self.login_form.error = Some(e.user_message());
            return;
        }

        self.login_form.error = None;
        self.login_form.in_progress = true;
        let username = self.login_form.username.clone();
        let password = self.login_form.password.clone();

        self.spawn(move |api, tx| async move {
            match auth::login(&api, &username, &password).await {
                Ok(session) => {
                    let _ = tx.send(UiMessage::LoggedIn(session));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::LoginFailed(e.user_message()));
                }
            }
        });
    }

    pub fn logout(&mut self) {
        auth::logout(&self.api);
        self.reset_session_state();
        self.toasts.info("Signed out");
    }

    /// Forget everything tied to the previous user.
    fn reset_session_state(&mut self) {
        self.current_panel = Panel::Dashboard;
        self.patients.clear();
        self.staff.clear();
        self.images.clear();
        self.reports.clear();
        self.appointments.clear();
        self.unassigned.clear();
        self.history = None;
        self.statement = None;
        self.missing_statement = None;
        self.profile = None;
        self.selected_patient = None;
        self.selected_report = None;
        self.billing_patient = None;
        self.patient_form.reset();
        self.staff_form.reset();
        self.scan_form.reset();
        self.schedule_form.reset();
        self.record_form.reset();
        self.diagnosis_form.reset();
        self.report_form.reset();
        self.charge_form.reset();
        self.upload_form.reset();
        self.login_form.password.clear();
        self.login_form.in_progress = false;
    }

    /// Sign out locally once the token's `exp` has passed.
    fn check_session_expiry(&mut self) {
        if let Some(session) = self.session()
            && session.is_expired(Utc::now())
        {
            tracing::info!("Session for {} expired", session.username);
            auth::logout(&self.api);
            self.reset_session_state();
            self.toasts.warning("Your session has expired, please sign in again");
        }
    }

    // ---- Loading ----

    pub fn load_patients(&self) {
        self.spawn(|api, tx| async move {
            match patients::list_all(&api).await {
                Ok(list) => {
                    let _ = tx.send(UiMessage::PatientsLoaded(list));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed("Loading patients".to_string(), e));
                }
            }
        });
    }

    /// Full staff list for the admin panel.
    pub fn load_staff(&self) {
        self.spawn(|api, tx| async move {
            match medical_staff::list_all(&api).await {
                Ok(list) => {
                    let _ = tx.send(UiMessage::StaffLoaded(list));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed("Loading staff".to_string(), e));
                }
            }
        });
    }

    /// Staff names for display only; failures leave ids unresolved.
    pub fn load_staff_names(&self) {
        self.spawn(|api, tx| async move {
            let list = medical_staff::lookup_names(&api).await;
            if !list.is_empty() {
                let _ = tx.send(UiMessage::StaffLoaded(list));
            }
        });
    }

    pub fn load_images(&mut self) {
        let patient_scope = match self.patient_scope() {
            Ok(scope) => scope,
            Err(e) => {
                self.toasts.warning(e.user_message());
                return;
            }
        };
        self.spawn(move |api, tx| async move {
            let result = match patient_scope {
                Some(id) => images::list_by_patient(&api, id).await,
                None => images::list_all(&api).await,
            };
            match result {
                Ok(list) => {
                    let _ = tx.send(UiMessage::ImagesLoaded(list));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed("Loading images".to_string(), e));
                }
            }
        });
    }

    pub fn load_reports(&mut self) {
        let patient_scope = match self.patient_scope() {
            Ok(scope) => scope,
            Err(e) => {
                self.toasts.warning(e.user_message());
                return;
            }
        };
        self.spawn(move |api, tx| async move {
            let result = match patient_scope {
                Some(id) => analytics::list_reports_by_patient(&api, id).await,
                None => analytics::list_reports(&api).await,
            };
            match result {
                Ok(list) => {
                    let _ = tx.send(UiMessage::ReportsLoaded(list));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed("Loading reports".to_string(), e));
                }
            }
        });
    }

    /// Appointments visible to the current role.
    pub fn load_appointments(&mut self) {
        let Some(role) = self.role() else {
            return;
        };
        let profile_id = self.profile_id();

        if role != Role::Admin && profile_id.is_none() {
            self.toasts
                .warning("Your account is not linked to a profile; appointments are unavailable");
            return;
        }

        self.spawn(move |api, tx| async move {
            let result = match (role, profile_id) {
                (Role::Patient, Some(id)) => scan_appointments::list_by_patient(&api, id).await,
                (Role::Doctor, Some(id)) => scan_appointments::list_by_doctor(&api, id).await,
                (Role::Radiologist, Some(id)) => scan_appointments::list_by_radiologist(&api, id).await,
                _ => scan_appointments::list_all(&api).await,
            };
            match result {
                Ok(list) => {
                    let _ = tx.send(UiMessage::AppointmentsLoaded(list));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed("Loading appointments".to_string(), e));
                }
            }
        });

        if role == Role::Radiologist {
            self.spawn(|api, tx| async move {
                match scan_appointments::list_unassigned(&api).await {
                    Ok(list) => {
                        let _ = tx.send(UiMessage::UnassignedLoaded(list));
                    }
                    Err(e) => {
                        let _ = tx.send(UiMessage::Failed("Loading scan requests".to_string(), e));
                    }
                }
            });
        }
    }

    pub fn load_history(&mut self, patient_id: i64) {
        if let Some(session) = self.session()
            && let Err(e) = session.ensure_patient_access(patient_id)
        {
            self.notify_error(e.user_message());
            return;
        }

        if self.selected_patient != Some(patient_id) {
            self.history = None;
        }
        self.selected_patient = Some(patient_id);

        self.spawn(move |api, tx| async move {
            let history = analytics::load_patient_history(&api, patient_id).await;
            let _ = tx.send(UiMessage::HistoryLoaded(patient_id, history));
        });
    }

    pub fn load_statement(&mut self, patient_id: i64) {
        if let Some(session) = self.session()
            && let Err(e) = session.ensure_patient_access(patient_id)
        {
            self.notify_error(e.user_message());
            return;
        }

        self.billing_patient = Some(patient_id);
        if self.statement.as_ref().is_some_and(|s| s.patient_id != patient_id) {
            self.statement = None;
        }

        self.spawn(move |api, tx| async move {
            match billing::load_statement(&api, patient_id).await {
                Ok((account, charges)) => {
                    let _ = tx.send(UiMessage::StatementLoaded(Statement {
                        patient_id,
                        account,
                        charges,
                    }));
                }
                Err(AppError::Server { status: 404, .. }) => {
                    let _ = tx.send(UiMessage::StatementMissing(patient_id));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed("Loading billing statement".to_string(), e));
                }
            }
        });
    }

    pub fn load_profile(&mut self) {
        let (Some(role), Some(profile_id)) = (self.role(), self.profile_id()) else {
            self.profile = None;
            return;
        };

        self.spawn(move |api, tx| async move {
            let result = match role {
                Role::Patient => patients::get_by_id(&api, profile_id).await.map(Profile::Patient),
                _ => medical_staff::get_by_id(&api, profile_id).await.map(Profile::Staff),
            };
            match result {
                Ok(profile) => {
                    let _ = tx.send(UiMessage::ProfileLoaded(profile));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed("Loading profile".to_string(), e));
                }
            }
        });
    }

    /// Patients only ever query their own records; staff see everything.
    fn patient_scope(&self) -> crate::Result<Option<i64>> {
        match self.role() {
            Some(Role::Patient) => self
                .profile_id()
                .map(Some)
                .ok_or_else(|| AppError::session("Your account is not linked to a patient record")),
            _ => Ok(None),
        }
    }

    // ---- Patients ----

    pub fn save_patient(&mut self) {
        let form = self.patient_form.clone();
        let name = format!("{} {}", form.first_name.trim(), form.last_name.trim());

        match (form.id, form.is_editing) {
            (Some(id), true) => match form.to_update() {
                Ok(data) => self.spawn_form_write(
                    FormKind::Patient,
                    "Updating patient",
                    format!("Patient '{name}' saved"),
                    self.reload_after_edit(id, Reload::Patients),
                    move |api| async move { patients::update(&api, id, &data).await },
                ),
                Err(e) => self.notify_error(e.user_message()),
            },
            _ => match form.to_create() {
                Ok(data) => self.spawn_form_write(
                    FormKind::Patient,
                    "Creating patient",
                    format!("Patient '{name}' created"),
                    Reload::Patients,
                    move |api| async move { patients::create(&api, &data).await },
                ),
                Err(e) => self.notify_error(e.user_message()),
            },
        }
    }

    /// Export the patient list as currently filtered.
    pub fn export_patients(&mut self) {
        let filtered = search::filter_patients(&self.patients, &self.patient_search);
        if filtered.is_empty() {
            self.notify_error("No patients to export");
            return;
        }

        let default_name = export::generate_export_filename("patients");
        let Some(path) = export::show_save_dialog(&default_name) else {
            return;
        };

        match export::export_patients_to_excel(&filtered, &path) {
            Ok(()) => self.notify_success(format!("Exported {} patients to {}", filtered.len(), path.display())),
            Err(e) => self.notify_error(format!("Export failed: {e}")),
        }
    }

    pub fn patient_name(&self, patient_id: i64) -> String {
        if let Some(Profile::Patient(me)) = &self.profile
            && me.id == patient_id
        {
            return me.full_name();
        }
        self.patients
            .iter()
            .find(|p| p.id == patient_id)
            .map(|p| p.full_name())
            .unwrap_or_else(|| format!("Patient #{patient_id}"))
    }

    // ---- Staff ----

    pub fn save_staff(&mut self) {
        let form = self.staff_form.clone();
        let name = format!("{} {}", form.first_name.trim(), form.last_name.trim());

        match (form.id, form.is_editing) {
            (Some(id), true) => match form.to_update() {
                Ok(data) => self.spawn_form_write(
                    FormKind::Staff,
                    "Updating staff member",
                    format!("Staff member '{name}' saved"),
                    self.reload_after_edit(id, Reload::Staff),
                    move |api| async move { medical_staff::update(&api, id, &data).await },
                ),
                Err(e) => self.notify_error(e.user_message()),
            },
            _ => match form.to_create() {
                Ok(data) => self.spawn_form_write(
                    FormKind::Staff,
                    "Creating staff member",
                    format!("Staff member '{name}' created"),
                    Reload::Staff,
                    move |api| async move { medical_staff::create(&api, &data).await },
                ),
                Err(e) => self.notify_error(e.user_message()),
            },
        }
    }

    // ---- Medical history ----

    pub fn save_record(&mut self) {
        let doctor_id = self.staff_profile_id();
        match self.record_form.to_request(doctor_id) {
            Ok(data) => {
                let patient_id = data.patient_id;
                self.spawn_form_write(
                    FormKind::Record,
                    "Saving medical record",
                    "Medical record added".to_string(),
                    Reload::History(patient_id),
                    move |api| async move { analytics::create_record(&api, &data).await },
                );
            }
            Err(e) => self.notify_error(e.user_message()),
        }
    }

    pub fn save_diagnosis(&mut self) {
        let doctor_id = self.staff_profile_id();
        match self.diagnosis_form.to_request(doctor_id) {
            Ok(data) => {
                let patient_id = data.patient_id;
                self.spawn_form_write(
                    FormKind::Diagnosis,
                    "Saving diagnosis",
                    "Diagnosis added".to_string(),
                    Reload::History(patient_id),
                    move |api| async move { analytics::create_diagnosis(&api, &data).await },
                );
            }
            Err(e) => self.notify_error(e.user_message()),
        }
    }

    // ---- Reports ----

    pub fn save_report(&mut self) {
        let radiologist_id = self.staff_profile_id();
        let id = self.report_form.id;
        match self.report_form.to_request(radiologist_id) {
            Ok(data) => match id {
                Some(id) => self.spawn_form_write(
                    FormKind::Report,
                    "Updating report",
                    format!("Report #{id} updated"),
                    Reload::Reports,
                    move |api| async move { analytics::update_report(&api, id, &data).await },
                ),
                None => self.spawn_form_write(
                    FormKind::Report,
                    "Creating report",
                    "Report created".to_string(),
                    Reload::Reports,
                    move |api| async move { analytics::create_report(&api, &data).await },
                ),
            },
            Err(e) => self.notify_error(e.user_message()),
        }
    }

    // ---- Images ----

    pub fn upload_image(&mut self) {
        match self.upload_form.to_upload() {
            Ok(upload) => {
                let file = upload
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                self.spawn_form_write(
                    FormKind::Upload,
                    "Uploading image",
                    format!("Uploaded {file}"),
                    Reload::Images,
                    move |api| async move { images::upload(&api, &upload).await },
                );
            }
            Err(e) => self.notify_error(e.user_message()),
        }
    }

    /// Ask where to save, then download in the background.
    pub fn download_image(&mut self, image: &MedicalImage) {
        let Some(dest) = rfd::FileDialog::new()
            .set_file_name(image.suggested_file_name())
            .save_file()
        else {
            return;
        };

        let image_id = image.id;
        let message = format!("Saved image to {}", dest.display());
        self.spawn_write("Downloading image", message, Reload::Nothing, move |api| async move {
            images::download_to(&api, image_id, &dest).await
        });
    }

    // ---- Scan workflow ----

    /// Validate and submit the scan request form.
    pub fn request_scan(&mut self) {
        let doctor_id = self.staff_profile_id();
        match self.scan_form.to_request(doctor_id) {
            Ok(data) => {
                self.spawn_form_write(
                    FormKind::ScanRequest,
                    "Requesting scan",
                    format!("{} scan requested", data.scan_type),
                    Reload::Appointments,
                    move |api| async move { scan_appointments::create(&api, &data).await },
                );
            }
            Err(e) => self.notify_error(e.user_message()),
        }
    }

    /// Apply a status button; the backend decides whether the move is allowed.
    /// Scheduling goes through the schedule dialog.
    pub fn change_scan_status(&mut self, appointment: &ScanAppointment, status: ScanStatus) {
        if status == ScanStatus::Scheduled {
            self.schedule_form = ScheduleForm::open(appointment.id);
            return;
        }

        let appointment = appointment.clone();
        let message = format!("Appointment #{} is now {}", appointment.id, status.label());
        self.spawn_write("Updating appointment", message, Reload::Appointments, move |api| async move {
            scan_appointments::change_status(&api, &appointment, status).await
        });
    }

    pub fn schedule_scan(&mut self) {
        let radiologist_id = match self.role() {
            Some(Role::Radiologist) => self.profile_id(),
            _ => None,
        };
        match self.schedule_form.to_update(radiologist_id) {
            Ok((id, data)) => {
                self.spawn_form_write(
                    FormKind::Schedule,
                    "Scheduling scan",
                    format!("Appointment #{id} scheduled"),
                    Reload::Appointments,
                    move |api| async move { scan_appointments::update(&api, id, &data).await },
                );
            }
            Err(e) => self.notify_error(e.user_message()),
        }
    }

    // ---- Billing ----

    pub fn pay_charge(&mut self, charge_id: i64) {
        let Some(patient_id) = self.billing_patient else {
            return;
        };
        self.spawn_write(
            "Paying charge",
            format!("Charge #{charge_id} paid"),
            Reload::Statement(patient_id),
            move |api| async move { billing::pay_charge(&api, charge_id).await },
        );
    }

    pub fn add_charge(&mut self) {
        let Some(patient_id) = self.billing_patient else {
            return;
        };
        match self.charge_form.to_request() {
            Ok(data) => {
                self.spawn_form_write(
                    FormKind::Charge,
                    "Adding charge",
                    "Charge added".to_string(),
                    Reload::Statement(patient_id),
                    move |api| async move { billing::create_charge(&api, &data).await },
                );
            }
            Err(e) => self.notify_error(e.user_message()),
        }
    }

    pub fn create_billing_account(&mut self, patient_id: i64) {
        let data = CreateBillingAccount {
            patient_id,
            insurance_provider: None,
            policy_number: None,
        };
        self.spawn_write(
            "Creating billing account",
            "Billing account created".to_string(),
            Reload::Statement(patient_id),
            move |api| async move { billing::create_account(&api, &data).await },
        );
    }

    pub fn export_statement(&mut self) {
        let Some(statement) = self.statement.clone() else {
            return;
        };
        let patient_name = self.patient_name(statement.patient_id);

        let default_name = export::generate_export_filename("statement");
        let Some(path) = export::show_save_dialog(&default_name) else {
            return;
        };

        match export::export_statement_to_excel(&patient_name, &statement.account, &statement.charges, &path) {
            Ok(()) => self.notify_success(format!("Exported statement to {}", path.display())),
            Err(e) => self.notify_error(format!("Export failed: {e}")),
        }
    }

    /// Editing your own record refreshes the profile instead of a list.
    fn reload_after_edit(&self, edited_id: i64, otherwise: Reload) -> Reload {
        let own = match (&self.profile, &otherwise) {
            (Some(Profile::Patient(p)), Reload::Patients) => p.id == edited_id,
            (Some(Profile::Staff(s)), Reload::Staff) => s.id == edited_id,
            _ => false,
        };
        if own && self.current_panel == Panel::Profile {
            Reload::Profile
        } else {
            otherwise
        }
    }

    /// Staff id of the signed-in doctor/radiologist, if any.
    fn staff_profile_id(&self) -> Option<i64> {
        match self.role() {
            Some(role) if role.is_staff() => self.profile_id(),
            _ => None,
        }
    }

    // ---- Settings ----

    pub fn test_connection(&mut self) {
        self.connection_test = None;
        self.connection_testing = true;
        let url = self.config.api.normalized_base_url();

        self.spawn(move |_api, tx| async move {
            let result = api::check_backend(&url).await.map_err(|e| e.user_message());
            let _ = tx.send(UiMessage::ConnectionTested(result));
        });
    }

    /// Validate, persist, and rebuild the client against the new settings.
    pub fn save_config(&mut self) {
        if let Err(e) = self.config.validate() {
            self.notify_error(e.to_string());
            return;
        }
        if let Err(e) = self.config.save(&self.config_path) {
            self.notify_error(format!("Failed to save config: {e}"));
            return;
        }

        match ApiClient::new(&self.config.api, self.api.session().clone()) {
            Ok(api) => self.api = api,
            Err(e) => {
                self.notify_error(e.user_message());
                return;
            }
        }

        self.toasts
            .set_duration(Duration::from_millis(self.config.ui.toast_duration_ms));
        self.config_modified = false;
        tracing::info!("Settings saved to {:?}", self.config_path);
        self.notify_success("Settings saved");
    }

    // ---- Message handling ----

    fn reload(&mut self, target: Reload) {
        match target {
            Reload::Nothing => {}
            Reload::Patients => self.load_patients(),
            Reload::Staff => self.load_staff(),
            Reload::Images => self.load_images(),
            Reload::Reports => self.load_reports(),
            Reload::Appointments => self.load_appointments(),
            Reload::History(id) => self.load_history(id),
            Reload::Statement(id) => self.load_statement(id),
            Reload::Profile => self.load_profile(),
        }
    }

    /// Poll async operation results.
    fn poll_async_results(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                UiMessage::LoggedIn(session) => {
                    self.login_form = LoginForm::default();
                    self.current_panel = Panel::Dashboard;
                    self.notify_success(format!("Welcome, {}", session.username));
                    self.load_dashboard_data();
                }
                UiMessage::LoginFailed(e) => {
                    self.login_form.in_progress = false;
                    self.login_form.error = Some(e.clone());
                    self.log_error(format!("Login failed: {e}"));
                }
                UiMessage::PatientsLoaded(list) => {
                    self.patients = list;
                }
                UiMessage::StaffLoaded(list) => {
                    self.staff = list;
                }
                UiMessage::ImagesLoaded(list) => {
                    self.images = list;
                }
                UiMessage::ReportsLoaded(list) => {
                    if let Some(id) = self.selected_report
                        && !list.iter().any(|r| r.id == id)
                    {
                        self.selected_report = None;
                    }
                    self.reports = list;
                }
                UiMessage::AppointmentsLoaded(list) => {
                    self.appointments = list;
                }
                UiMessage::UnassignedLoaded(list) => {
                    self.unassigned = list;
                }
                UiMessage::HistoryLoaded(patient_id, history) => {
                    // Ignore late results for a patient no longer selected
                    if self.selected_patient == Some(patient_id) {
                        let view = HistoryView::from_history(patient_id, history);
                        let errors = [
                            view.records.as_ref().err(),
                            view.diagnoses.as_ref().err(),
                            view.reports.as_ref().err(),
                        ];
                        for err in errors.into_iter().flatten() {
                            tracing::warn!("Partial history for patient {}: {}", patient_id, err);
                        }
                        self.history = Some(view);
                    }
                }
                UiMessage::StatementLoaded(statement) => {
                    if self.billing_patient == Some(statement.patient_id) {
                        self.missing_statement = None;
                        self.statement = Some(statement);
                    }
                }
                UiMessage::StatementMissing(patient_id) => {
                    if self.billing_patient == Some(patient_id) {
                        self.statement = None;
                        self.missing_statement = Some(patient_id);
                    }
                }
                UiMessage::ProfileLoaded(profile) => {
                    self.profile = Some(profile);
                }
                UiMessage::Saved(message, reload, form) => {
                    self.notify_success(message);
                    if let Some(form) = form {
                        self.close_form(form);
                    }
                    self.reload(reload);
                }
                UiMessage::Failed(context, e) => {
                    if e.requires_login() {
                        // The client already dropped the token; routing falls back to login
                        self.reset_session_state();
                        self.toasts.warning(e.user_message());
                        self.log_warning(format!("{context}: {e}"));
                    } else {
                        tracing::error!("{}: {}", context, e);
                        self.notify_error(format!("{context}: {}", e.user_message()));
                    }
                }
                UiMessage::ConnectionTested(result) => {
                    self.connection_testing = false;
                    match &result {
                        Ok(()) => self.log_success("Backend reachable"),
                        Err(e) => self.log_error(format!("Backend unreachable: {e}")),
                    }
                    self.connection_test = Some(result);
                }
            }
        }
    }

    /// Render menu bar.
    fn show_menu_bar(&mut self, ctx: &egui::Context, role: Role) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("Go", |ui| {
                    if ui.button(Panel::Dashboard.name()).clicked() {
                        self.open_panel(Panel::Dashboard);
                        ui.close();
                    }
                    ui.separator();
                    for panel in role.panels() {
                        if ui.button(panel.name()).clicked() {
                            self.open_panel(*panel);
                            ui.close();
                        }
                    }
                });
                ui.menu_button("Account", |ui| {
                    if role.panels().contains(&Panel::Profile) && ui.button(format!("{USER} My Profile")).clicked() {
                        self.open_panel(Panel::Profile);
                        ui.close();
                    }
                    if ui.button(format!("{GEAR} Settings")).clicked() {
                        self.open_panel(Panel::Settings);
                        ui.close();
                    }
                    ui.separator();
                    if ui.button(format!("{SIGN_OUT} Sign Out")).clicked() {
                        self.logout();
                        ui.close();
                    }
                });
            });
        });
    }

    /// Render status bar (display only, no interaction).
    fn show_status_bar(&self, ctx: &egui::Context, role: Role) {
        let username = self.session().map(|s| s.username).unwrap_or_default();

        egui::TopBottomPanel::bottom("status_bar")
            .min_height(28.0)
            .show(ctx, |ui| {
                ui.disable();
                ui.horizontal(|ui| {
                    ui.colored_label(colors::SUCCESS, format!("{username} ({})", role.label()));
                    ui.separator();
                    ui.label(self.api.base_url());

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if self.is_loading() {
                            ui.spinner();
                            ui.label("Loading...");
                        }
                    });
                });
            });
    }

    /// Render the delete confirmation dialog.
    fn show_dialogs(&mut self, ctx: &egui::Context) {
        if self.show_delete_confirm
            && let Some(ref target) = self.delete_target.clone()
        {
            let (title, message) = match target {
                DeleteTarget::Patient(_, name) => ("Delete Patient", format!("Delete patient '{}'?", name)),
                DeleteTarget::Staff(_, name) => ("Delete Staff Member", format!("Delete staff member '{}'?", name)),
                DeleteTarget::Image(_, name) => ("Delete Image", format!("Delete image '{}'?", name)),
                DeleteTarget::Report(_, name) => ("Delete Report", format!("Delete report '{}'?", name)),
                DeleteTarget::Appointment(_, name) => ("Delete Appointment", format!("Delete appointment '{}'?", name)),
            };

            egui::Window::new(title)
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            self.show_delete_confirm = false;
                            self.delete_target = None;
                        }
                        if ui.button("Delete").clicked() {
                            self.confirm_delete();
                            self.show_delete_confirm = false;
                            self.delete_target = None;
                        }
                    });
                });
        }
    }

    /// Execute the confirmed delete operation.
    fn confirm_delete(&mut self) {
        let Some(target) = self.delete_target.take() else {
            return;
        };

        match target {
            DeleteTarget::Patient(id, name) => {
                self.log_info(format!("Deleting patient: {}", name));
                if self.selected_patient == Some(id) {
                    self.selected_patient = None;
                    self.history = None;
                }
                self.spawn_write("Deleting patient", format!("Patient '{name}' deleted"), Reload::Patients, move |api| async move {
                    patients::delete(&api, id).await
                });
            }
            DeleteTarget::Staff(id, name) => {
                self.log_info(format!("Deleting staff member: {}", name));
                self.spawn_write("Deleting staff member", format!("Staff member '{name}' deleted"), Reload::Staff, move |api| async move {
                    medical_staff::delete(&api, id).await
                });
            }
            DeleteTarget::Image(id, name) => {
                self.log_info(format!("Deleting image: {}", name));
                self.spawn_write("Deleting image", format!("Image '{name}' deleted"), Reload::Images, move |api| async move {
                    images::delete(&api, id).await
                });
            }
            DeleteTarget::Report(id, name) => {
                self.log_info(format!("Deleting report: {}", name));
                self.spawn_write("Deleting report", format!("Report '{name}' deleted"), Reload::Reports, move |api| async move {
                    analytics::delete_report(&api, id).await
                });
            }
            DeleteTarget::Appointment(id, name) => {
                self.log_info(format!("Deleting appointment: {}", name));
                self.spawn_write(
                    "Deleting appointment",
                    format!("Appointment '{name}' deleted"),
                    Reload::Appointments,
                    move |api| async move { scan_appointments::delete(&api, id).await },
                );
            }
        }
    }

    fn show_portal(&mut self, ctx: &egui::Context, role: Role) {
        self.show_menu_bar(ctx, role);
        self.show_status_bar(ctx, role);
        self.show_dialogs(ctx);

        // A panel left over from another role falls back to the dashboard
        if !can_open(role, self.current_panel) {
            self.current_panel = Panel::Dashboard;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let go_back = match self.current_panel {
                Panel::Dashboard => {
                    if let Some(next) = dashboard::show(self, ui, role) {
                        self.open_panel(next);
                    }
                    false
                }
                Panel::Profile => profile_panel::show(self, ui),
                Panel::PatientRecords => patient_records_panel::show(self, ui),
                Panel::ImageReview => image_review_panel::show(self, ui),
                Panel::Reports => reports_panel::show(self, ui),
                Panel::Billing => billing_panel::show(self, ui),
                Panel::ScanAppointments => scan_panel::show(self, ui, role),
                Panel::Staff => staff_panel::show(self, ui),
                Panel::Settings => settings_panel::show(self, ui),
            };

            if go_back {
                self.open_panel(Panel::Dashboard);
            }
        });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll async results
        self.poll_async_results();
        self.check_session_expiry();

        match resolve_home(self.role()) {
            Route::Login => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    login::show(self, ui);
                    if self.login_form.in_progress {
                        loading_spinner(ui, "Signing in...");
                    }
                });
            }
            Route::Dashboard(role) => self.show_portal(ctx, role),
        }

        self.toasts.show(ctx);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::tests::client_for;
    use crate::session::SessionHandle;

    pub(crate) fn test_app() -> App {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let api = client_for("http://127.0.0.1:9/api", SessionHandle::in_memory());
        App::new(
            egui::Context::default(),
            api,
            AppConfig::default(),
            PathBuf::from("config.toml"),
            rt,
        )
    }

    fn filled_scan_form() -> ScanRequestForm {
        ScanRequestForm {
            body_part: "Chest".to_string(),
            reason: "Persistent cough".to_string(),
            ..ScanRequestForm::for_patient(Some(7))
        }
    }

    #[test]
    fn test_request_keeps_form_until_saved() {
        let mut app = test_app();
        app.scan_form = filled_scan_form();

        app.request_scan();
        assert!(app.scan_form.is_open);
        assert_eq!(app.scan_form.reason, "Persistent cough");
    }

    #[test]
    fn test_failed_write_keeps_input() {
        let mut app = test_app();
        app.scan_form = filled_scan_form();
        app.charge_form = ChargeForm::for_account(3);
        app.charge_form.amount_input = "120".to_string();

        app.tx
            .send(UiMessage::Failed(
                "Requesting scan".to_string(),
                AppError::Server {
                    status: 400,
                    message: "Patient not found".to_string(),
                },
            ))
            .unwrap();
        app.poll_async_results();

        assert!(app.scan_form.is_open);
        assert_eq!(app.scan_form.body_part, "Chest");
        assert_eq!(app.charge_form.amount_input, "120");
    }

    #[test]
    fn test_saved_closes_only_its_own_form() {
        let mut app = test_app();
        app.scan_form = filled_scan_form();
        app.charge_form = ChargeForm::for_account(3);
        app.patient_form = PatientForm::open_new();
        app.patient_form.first_name = "Jane".to_string();

        app.tx
            .send(UiMessage::Saved("Charge added".to_string(), Reload::Nothing, Some(FormKind::Charge)))
            .unwrap();
        app.poll_async_results();

        assert!(!app.charge_form.is_open);
        assert!(app.scan_form.is_open);
        assert_eq!(app.patient_form.first_name, "Jane");
    }

    #[test]
    fn test_unrelated_save_leaves_forms_open() {
        let mut app = test_app();
        app.patient_form = PatientForm::open_new();
        app.patient_form.first_name = "Jane".to_string();
        app.schedule_form = ScheduleForm::open(11);

        app.tx
            .send(UiMessage::Saved("Image 'scan.png' deleted".to_string(), Reload::Nothing, None))
            .unwrap();
        app.poll_async_results();

        assert!(app.patient_form.is_open);
        assert!(app.schedule_form.is_open);
    }
}
