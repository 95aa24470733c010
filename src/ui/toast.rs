//! Transient notifications in the bottom-right corner.

use std::time::{Duration, Instant};

use eframe::egui::{self, Align2, RichText};
use egui_phosphor::regular::X;

use super::components::colors;

/// Default time a toast stays visible.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.duration
    }
}

/// Toast queue. Time is passed in so expiry does not depend on the frame clock.
#[derive(Debug)]
pub struct Toasts {
    items: Vec<Toast>,
    next_id: u64,
    duration: Duration,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl Toasts {
    pub fn new(duration: Duration) -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
            duration,
        }
    }

    /// Applies to toasts pushed from now on.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Add a toast created at `now`; returns its id.
    pub fn push_at(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Toast {
            id,
            kind,
            message: message.into(),
            created_at: now,
            duration: self.duration,
        });
        id
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.push_at(kind, message, Instant::now())
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Info, message)
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Success, message)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Warning, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Error, message)
    }

    /// Remove a toast before it expires.
    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|t| t.id != id);
    }

    /// Drop expired toasts.
    pub fn tick(&mut self, now: Instant) {
        self.items.retain(|t| !t.is_expired(now));
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Tick, then draw the remaining toasts.
    pub fn show(&mut self, ctx: &egui::Context) {
        self.tick(Instant::now());
        if self.items.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("toast_area"))
            .anchor(Align2::RIGHT_BOTTOM, [-16.0, -40.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in &self.items {
                    let color = match toast.kind {
                        ToastKind::Info => colors::INFO,
                        ToastKind::Success => colors::SUCCESS,
                        ToastKind::Warning => colors::WARNING,
                        ToastKind::Error => colors::ERROR,
                    };

                    egui::Frame::popup(ui.style())
                        .stroke(egui::Stroke::new(1.0, color))
                        .show(ui, |ui| {
                            ui.set_max_width(360.0);
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(&toast.message).color(color));
                                if ui.small_button(X).clicked() {
                                    dismissed = Some(toast.id);
                                }
                            });
                        });
                    ui.add_space(6.0);
                }
            });

        if let Some(id) = dismissed {
            self.dismiss(id);
        }

        // Keep repainting so toasts disappear on time without input.
        ctx.request_repaint_after(Duration::from_millis(200));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_duration_is_three_seconds() {
        let mut toasts = Toasts::default();
        let start = Instant::now();
        toasts.push_at(ToastKind::Info, "Saved", start);

        toasts.tick(start + Duration::from_millis(2999));
        assert_eq!(toasts.items().len(), 1);

        toasts.tick(start + Duration::from_millis(3000));
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_custom_duration() {
        let mut toasts = Toasts::new(Duration::from_millis(500));
        let start = Instant::now();
        toasts.push_at(ToastKind::Error, "Failed", start);

        toasts.tick(start + Duration::from_millis(499));
        assert_eq!(toasts.items().len(), 1);
        toasts.tick(start + Duration::from_millis(501));
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_dismiss_early() {
        let mut toasts = Toasts::default();
        let start = Instant::now();
        let first = toasts.push_at(ToastKind::Success, "one", start);
        let second = toasts.push_at(ToastKind::Warning, "two", start);

        toasts.dismiss(first);
        assert_eq!(toasts.items().len(), 1);
        assert_eq!(toasts.items()[0].id, second);

        // Unknown ids are ignored
        toasts.dismiss(999);
        assert_eq!(toasts.items().len(), 1);
    }

    #[test]
    fn test_staggered_expiry() {
        let mut toasts = Toasts::default();
        let start = Instant::now();
        toasts.push_at(ToastKind::Info, "early", start);
        toasts.push_at(ToastKind::Info, "late", start + Duration::from_millis(1000));

        toasts.tick(start + Duration::from_millis(3500));
        assert_eq!(toasts.items().len(), 1);
        assert_eq!(toasts.items()[0].message, "late");
    }

    #[test]
    fn test_ids_are_unique() {
        let mut toasts = Toasts::default();
        let a = toasts.info("a");
        let b = toasts.error("b");
        assert_ne!(a, b);
    }
}
