use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing::debug;

use crate::app::commands;
use crate::app::models::Device;
use crate::app::prompt::confirm;
use crate::app::state::AppState;

pub const NO_DEVICES_HINT: &str = "No devices found.\n\nCheck that:\n  - adb is installed\n  - the device is connected\n  - USB debugging is enabled";

const HELP: &str = "\
Commands:
  devices | refresh        re-scan attached devices
  select <n>               pick device n from the list
  link <uri>               put a deep-link into the input
  launch [uri]             launch the input (or uri) on the selected device
  history                  show history
  favorites                show favorites
  h <n> / hl <n>           fill from / launch history entry n
  f <n> / fl <n>           fill from / launch favorite n
  fav <name>               save the input as a favorite
  rename <n> <name>        rename favorite n
  del <n>                  delete favorite n
  clear-favorites          delete all favorites
  clear-history            delete the history
  export <path>            write history and favorites to a file
  import <path>            merge a previously exported file
  status                   show selected device and input
  help                     this text
  quit                     leave";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Terminal counterpart of the launcher window: device picker, deep-link input and the
/// two lists, driven one line at a time.
#[derive(Debug, Default)]
pub struct Form {
    devices: Vec<Device>,
    selected: Option<String>,
    input: String,
    assume_yes: bool,
}

impl Form {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            ..Self::default()
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replaces the device list, keeping the previous selection when it is still attached.
    pub fn set_devices(&mut self, devices: Vec<Device>) {
        let keep = self
            .selected
            .as_ref()
            .filter(|serial| devices.iter().any(|device| &device.serial == *serial))
            .cloned();
        self.selected = keep.or_else(|| devices.first().map(|device| device.serial.clone()));
        self.devices = devices;
    }

    pub fn run<R: BufRead, W: Write>(
        &mut self,
        state: &mut AppState,
        input: &mut R,
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(out, "Deep-link launcher. Type `help` for commands.")?;
        self.refresh(state, out)?;
        loop {
            write!(out, "> ")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(());
            }
            if self.handle_line(state, &line, input, out)? == Flow::Quit {
                return Ok(());
            }
        }
    }

    pub fn refresh<W: Write>(&mut self, state: &AppState, out: &mut W) -> io::Result<()> {
        let response = commands::list_devices(state, None);
        self.set_devices(response.data);
        if self.devices.is_empty() {
            writeln!(out, "{NO_DEVICES_HINT}")?;
            return Ok(());
        }
        self.print_devices(out)
    }

    pub fn handle_line<R: BufRead, W: Write>(
        &mut self,
        state: &mut AppState,
        line: &str,
        input: &mut R,
        out: &mut W,
    ) -> io::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        debug!(command = %command, "form command");

        match command {
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            "help" | "?" => writeln!(out, "{HELP}")?,
            "devices" | "refresh" => self.refresh(state, out)?,
            "select" => match parse_index(rest) {
                Some(index) if index < self.devices.len() => {
                    self.selected = Some(self.devices[index].serial.clone());
                    writeln!(out, "Selected {}", self.devices[index].label())?;
                }
                _ => writeln!(out, "No device #{rest}")?,
            },
            "link" => {
                self.input = rest.to_string();
            }
            "status" => self.print_status(out)?,
            "launch" => {
                if !rest.is_empty() {
                    self.input = rest.to_string();
                }
                self.launch(state, out)?;
            }
            "history" => print_history(state, out)?,
            "favorites" => print_favorites(state, out)?,
            "h" | "hl" => match parse_index(rest).and_then(|i| state.store.history().get(i)) {
                Some(link) => {
                    self.input = link.clone();
                    if command == "hl" {
                        self.launch(state, out)?;
                    } else {
                        writeln!(out, "Input: {}", self.input)?;
                    }
                }
                None => writeln!(out, "No history entry #{rest}")?,
            },
            "f" | "fl" => match parse_index(rest).and_then(|i| state.store.favorites().get(i)) {
                Some(favorite) => {
                    self.input = favorite.deeplink.clone();
                    if command == "fl" {
                        self.launch(state, out)?;
                    } else {
                        writeln!(out, "Input: {}", self.input)?;
                    }
                }
                None => writeln!(out, "No favorite #{rest}")?,
            },
            "fav" => {
                if self.input.trim().is_empty() {
                    writeln!(out, "Enter a deep-link first (`link <uri>`)")?;
                } else if rest.is_empty() {
                    writeln!(out, "Usage: fav <name>")?;
                } else {
                    match commands::add_favorite(state, rest.to_string(), self.input.clone(), None)
                    {
                        Ok(_) => print_favorites(state, out)?,
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                }
            }
            "rename" => {
                let (index, name) = match rest.split_once(char::is_whitespace) {
                    Some((index, name)) => (parse_index(index), name.trim()),
                    None => (parse_index(rest), ""),
                };
                match index {
                    Some(index) => {
                        match commands::rename_favorite(state, index, name.to_string(), None) {
                            Ok(response) if response.data => print_favorites(state, out)?,
                            Ok(_) => writeln!(out, "Nothing renamed")?,
                            Err(err) => writeln!(out, "error: {err}")?,
                        }
                    }
                    None => writeln!(out, "Usage: rename <n> <name>")?,
                }
            }
            "del" => {
                let Some(favorite) = parse_index(rest)
                    .and_then(|index| state.store.favorites().get(index).map(|f| (index, f.clone())))
                else {
                    writeln!(out, "No favorite #{rest}")?;
                    return Ok(Flow::Continue);
                };
                let (index, favorite) = favorite;
                let question = format!("Delete favorite \"{}\"?", favorite.name);
                if confirm(self.assume_yes, &question, input, out)? {
                    match commands::delete_favorite(state, index, None) {
                        Ok(_) => print_favorites(state, out)?,
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                }
            }
            "clear-favorites" => {
                if confirm(self.assume_yes, "Delete all favorites?", input, out)? {
                    match commands::clear_favorites(state, None) {
                        Ok(response) => writeln!(out, "Removed {} favorites", response.data)?,
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                }
            }
            "clear-history" => {
                if state.store.history().is_empty() {
                    writeln!(out, "History is already empty")?;
                } else if confirm(self.assume_yes, "Clear the history?", input, out)? {
                    match commands::clear_history(state, None) {
                        Ok(response) => writeln!(out, "Removed {} entries", response.data)?,
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                }
            }
            "export" => {
                if rest.is_empty() {
                    writeln!(out, "Usage: export <path>")?;
                } else {
                    match commands::export_links(state, Path::new(rest), None) {
                        Ok(_) => writeln!(out, "Exported to {rest}")?,
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                }
            }
            "import" => {
                if rest.is_empty() {
                    writeln!(out, "Usage: import <path>")?;
                } else {
                    match commands::import_links(state, Path::new(rest), None) {
                        Ok(response) => writeln!(
                            out,
                            "Added: favorites {}, history {}",
                            response.data.favorites_added, response.data.history_added
                        )?,
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                }
            }
            other => writeln!(out, "Unknown command `{other}`; type `help`")?,
        }
        Ok(Flow::Continue)
    }

    fn launch<W: Write>(&mut self, state: &mut AppState, out: &mut W) -> io::Result<()> {
        if self.input.trim().is_empty() {
            return writeln!(out, "Enter a deep-link first (`link <uri>`)");
        }
        match commands::launch_deeplink(state, self.selected.clone(), self.input.clone(), None) {
            Ok(response) => {
                let target = response.data.serial.as_deref().unwrap_or("default device");
                writeln!(out, "Launched {} on {target}", response.data.deeplink)
            }
            Err(err) => writeln!(out, "error: {err}"),
        }
    }

    fn print_devices<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (index, device) in self.devices.iter().enumerate() {
            let marker = if self.selected.as_deref() == Some(device.serial.as_str()) {
                '*'
            } else {
                ' '
            };
            writeln!(out, "{marker}[{index}] {}", device.label())?;
        }
        Ok(())
    }

    fn print_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let device = self
            .selected
            .as_deref()
            .and_then(|serial| self.devices.iter().find(|device| device.serial == serial))
            .map(Device::label)
            .unwrap_or_else(|| "(none)".to_string());
        writeln!(out, "Device: {device}")?;
        writeln!(out, "Input:  {}", self.input)
    }
}

fn parse_index(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

pub fn print_history<W: Write>(state: &AppState, out: &mut W) -> io::Result<()> {
    if state.store.history().is_empty() {
        return writeln!(out, "(history is empty)");
    }
    for (index, link) in state.store.history().iter().enumerate() {
        writeln!(out, "[{index}] {link}")?;
    }
    Ok(())
}

pub fn print_favorites<W: Write>(state: &AppState, out: &mut W) -> io::Result<()> {
    if state.store.favorites().is_empty() {
        return writeln!(out, "(no favorites)");
    }
    for (index, favorite) in state.store.favorites().iter().enumerate() {
        writeln!(out, "[{index}] {}", favorite.label())?;
    }
    Ok(())
}
