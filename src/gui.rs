// src/gui.rs
use crate::config::PanelConfig;
use crate::drivers::{ChartFrame, CommandGroup, DeviceCommand, DisplayBounds};
use crate::engine;
use crate::types::*;
use chrono::{Local, TimeZone};
use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoints};
use std::sync::mpsc::{channel, Receiver, Sender};

// 界面日志保留条数
const LOG_LINES: usize = 8;

const BUTTON_ROWS: [(&str, CommandGroup); 5] = [
    ("GAIN", CommandGroup::Gain),
    ("SAMPLE RATE", CommandGroup::SampleRate),
    ("INPUT", CommandGroup::Input),
    ("OFFSET", CommandGroup::Zero),
    ("FIRMWARE", CommandGroup::Bootloader),
];

pub struct SeismicPanelApp {
    // 系统状态
    state: SessionState,
    connection_mode: ConnectionMode,

    // 最新一帧绘图数据 (断开后保留，重连时清空)
    frame: Option<ChartFrame>,

    // 界面日志
    log_messages: Vec<String>,

    // 通讯管道
    rx: Receiver<PanelMessage>,
    tx_cmd: Sender<GuiCommand>,
}

impl SeismicPanelApp {
    pub fn new(ctx: egui::Context, config: PanelConfig) -> Self {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();

        // 启动后台引擎，每条消息都唤醒界面重绘
        engine::spawn_thread(tx, rx_cmd, config, Box::new(move || ctx.request_repaint()));

        Self {
            state: SessionState::Disconnected,
            connection_mode: ConnectionMode::Hardware,
            frame: None,
            log_messages: vec!["Seismic panel ready.".to_owned()],
            rx,
            tx_cmd,
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > LOG_LINES {
            self.log_messages.remove(0);
        }
    }

    fn send(&self, cmd: GuiCommand) {
        if self.tx_cmd.send(cmd).is_err() {
            log::error!("Engine thread is gone.");
        }
    }

    fn apply(&mut self, msg: PanelMessage) {
        match msg {
            PanelMessage::Log(s) => self.log(&s),
            PanelMessage::Status(state) => {
                if state == SessionState::Connected {
                    self.frame = None;
                }
                self.state = state;
            }
            PanelMessage::Frame(frame) => self.frame = Some(frame),
        }
    }

    fn connection_controls(&mut self, ui: &mut egui::Ui) {
        let idle = self.state == SessionState::Disconnected;
        ui.add_enabled_ui(idle, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.connection_mode, ConnectionMode::Hardware, "REAL");
                ui.selectable_value(&mut self.connection_mode, ConnectionMode::Simulation, "SIM");
            });
        });

        let (btn_txt, cmd) = match self.state {
            SessionState::Disconnected => ("CONNECT", GuiCommand::Connect(self.connection_mode)),
            SessionState::Connecting | SessionState::Connected => {
                ("DISCONNECT", GuiCommand::Disconnect)
            }
        };
        let can_click = self.state != SessionState::Connecting;
        if ui.add_enabled(can_click, egui::Button::new(btn_txt)).clicked() {
            self.send(cmd);
        }

        let (status_txt, status_col) = match self.state {
            SessionState::Disconnected => ("Disconnected", Color32::GRAY),
            SessionState::Connecting => ("Connecting...", Color32::YELLOW),
            SessionState::Connected => ("Connected", Color32::GREEN),
        };
        ui.label(RichText::new(status_txt).color(status_col).small());
    }

    fn command_buttons(&self, ui: &mut egui::Ui) {
        let enabled = self.state.controls_enabled();
        for (title, group) in BUTTON_ROWS {
            ui.add_space(6.0);
            ui.label(title);
            ui.horizontal_wrapped(|ui| {
                for command in DeviceCommand::in_group(group) {
                    let mut button = egui::Button::new(command.label());
                    if command == DeviceCommand::Bootloader {
                        button = button.fill(Color32::from_rgb(90, 30, 30));
                    }
                    if ui.add_enabled(enabled, button).clicked() {
                        self.send(GuiCommand::Send(command));
                    }
                }
            });
        }
    }

    fn chart(&self, ui: &mut egui::Ui) {
        let bounds = self.frame.as_ref().map(|f| f.bounds).unwrap_or_else(|| {
            let now = crate::drivers::session::now_seconds();
            DisplayBounds {
                x_min: now - crate::drivers::series::WINDOW_SECONDS,
                x_max: now,
                y_min: DisplayBounds::INITIAL_Y_MIN,
                y_max: DisplayBounds::INITIAL_Y_MAX,
            }
        });
        Plot::new("seismic_plot")
            .legend(Legend::default())
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .x_axis_formatter(|x, _max_chars, _range| format_clock(x))
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [bounds.x_min, bounds.y_min],
                    [bounds.x_max, bounds.y_max],
                ));
                if let Some(frame) = &self.frame {
                    plot_ui.line(
                        Line::new(PlotPoints::new(frame.points.clone()))
                            .name("Seismic Data")
                            .color(Color32::from_rgb(0, 99, 132)),
                    );
                }
            });
    }
}

/// Axis label for a UNIX timestamp in local wall-clock time.
pub fn format_clock(timestamp: f64) -> String {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    match Local.timestamp_opt(secs as i64, nanos).single() {
        Some(t) => t.format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

impl eframe::App for SeismicPanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 消息处理 loop
        while let Ok(msg) = self.rx.try_recv() {
            self.apply(msg);
        }

        if self.state != SessionState::Disconnected {
            ctx.request_repaint();
        }

        // 2. UI 绘制
        egui::SidePanel::left("L").min_width(260.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("Seismic Panel");
            ui.separator();

            self.connection_controls(ui);
            ui.separator();
            self.command_buttons(ui);

            ui.add_space(20.0);
            ui.separator();
            egui::ScrollArea::vertical()
                .max_height(140.0)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for m in &self.log_messages {
                        ui.monospace(m);
                    }
                });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.frame.is_none() && !self.state.controls_enabled() {
                ui.label("Connect first.");
            }
            self.chart(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_labels_are_hh_mm_ss() {
        let label = format_clock(1_700_000_000.25);
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);
    }

    #[test]
    fn button_rows_cover_every_command() {
        let total: usize = BUTTON_ROWS
            .iter()
            .map(|(_, group)| DeviceCommand::in_group(*group).count())
            .sum();
        assert_eq!(total, DeviceCommand::ALL.len());
    }
}
