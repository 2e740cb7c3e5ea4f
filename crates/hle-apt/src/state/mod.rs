//! Applet manager state shared by every APT facade.
//!
//! All transitions are plain methods returning [`AptError`] so they can be
//! exercised without going through the command buffer codec. Handlers call
//! them under the module lock.

mod parameter;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::applet::{AppletId, SignalType};
use crate::errors::AptError;

pub use self::parameter::MessageParameter;

/// Size of the argument block handed to the home menu.
pub const SYS_MENU_ARG_SIZE: usize = 0x40;
/// Size of the parameter block delivered across an application jump.
pub const DELIVER_ARG_SIZE: usize = 0x300;
/// Size of the HMAC delivered across an application jump.
pub const DELIVER_HMAC_SIZE: usize = 0x20;
/// Size of the capture buffer descriptor.
pub const CAPTURE_BUFFER_INFO_SIZE: usize = 0x20;
/// Size of the wireless reboot descriptor.
pub const WIRELESS_REBOOT_INFO_SIZE: usize = 0x10;
/// Largest startup argument a guest may request.
pub const MAX_STARTUP_ARGUMENT_SIZE: usize = 0x1000;

const FIRST_HANDLE: u32 = 0x0000_1000;
const DEFAULT_CPU_TIME_LIMIT: u32 = 80;
const CPU_TIME_LIMIT_RANGE: std::ops::RangeInclusive<u32> = 5..=89;

/// A registered applet and its kernel objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppletSlot {
    /// Applet occupying the slot.
    pub applet: AppletId,
    /// Attribute word passed at initialisation.
    pub attributes: u32,
    /// Set once the applet calls `Enable`.
    pub enabled: bool,
    /// Notification waiting to be inquired.
    pub notification: u32,
    /// Handle of the notification event.
    pub notification_event: u32,
    /// Handle of the parameter event.
    pub parameter_event: u32,
}

/// Progress of the library applet occupying the library slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryStage {
    /// `PrepareToStartLibraryApplet` was called.
    Prepared,
    /// `PreloadLibraryApplet` was called.
    Preloading,
    /// Preloading finished.
    Loaded,
    /// The applet is running.
    Started,
    /// `PrepareToCloseLibraryApplet` was called.
    Closing,
}

impl LibraryStage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Prepared => "prepared",
            Self::Preloading => "preloading",
            Self::Loaded => "loaded",
            Self::Started => "started",
            Self::Closing => "closing",
        }
    }
}

/// The library applet slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryApplet {
    /// Applet occupying the slot.
    pub applet: AppletId,
    /// Current stage.
    pub stage: LibraryStage,
}

/// A prepared or performed application jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationJump {
    /// Jump flags as passed by the guest.
    pub flags: u32,
    /// Program to jump to.
    pub program_id: u64,
    /// Media the program lives on.
    pub media_type: u8,
    /// Set once `DoApplicationJump` ran.
    pub performed: bool,
}

/// Arguments carried across an application jump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverArg {
    /// Parameter block.
    pub param: Vec<u8>,
    /// HMAC over the parameter block.
    pub hmac: Vec<u8>,
    /// Program that performed the jump.
    pub source_program_id: u64,
}

/// Snapshot of the applet manager returned by `GetAppletManInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppletManInfo {
    /// Position echoed back from the request.
    pub position: u32,
    /// Applet that most recently asked to run.
    pub requested: AppletId,
    /// Home menu applet id.
    pub home_menu: AppletId,
    /// Applet currently in the foreground.
    pub active: AppletId,
}

/// Mutable state behind the APT facades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AptState {
    lock_handle: u32,
    next_handle: u32,
    applet_attributes: u32,
    applets: Vec<AppletSlot>,
    parameter: Option<MessageParameter>,
    library: Option<LibraryApplet>,
    jump: Option<ApplicationJump>,
    deliver_arg: Option<DeliverArg>,
    program_id: u64,
    media_type: u8,
    sys_menu_arg: Vec<u8>,
    capture_buffer: Option<Vec<u8>>,
    wireless_reboot_info: Vec<u8>,
    cpu_time_limit: u32,
    screen_cap_post_permission: u32,
    new_3ds: bool,
}

impl Default for AptState {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AptState {
    /// Fresh state for a console of the given model.
    #[must_use]
    pub fn new(new_3ds: bool) -> Self {
        Self {
            lock_handle: FIRST_HANDLE,
            next_handle: FIRST_HANDLE + 1,
            applet_attributes: 0,
            applets: Vec::new(),
            parameter: None,
            library: None,
            jump: None,
            deliver_arg: None,
            program_id: 0,
            media_type: 0,
            sys_menu_arg: vec![0; SYS_MENU_ARG_SIZE],
            capture_buffer: None,
            wireless_reboot_info: vec![0; WIRELESS_REBOOT_INFO_SIZE],
            cpu_time_limit: DEFAULT_CPU_TIME_LIMIT,
            screen_cap_post_permission: 0,
            new_3ds,
        }
    }

    /// Sets the program the guest is running.
    #[must_use]
    pub const fn with_program(mut self, program_id: u64, media_type: u8) -> Self {
        self.program_id = program_id;
        self.media_type = media_type;
        self
    }

    /// Handle of the APT lock mutex. Records the caller's attribute word.
    pub const fn lock_handle(&mut self, attributes: u32) -> u32 {
        self.applet_attributes = attributes;
        self.lock_handle
    }

    /// Attribute word recorded by the last `GetLockHandle`.
    #[must_use]
    pub const fn applet_attributes(&self) -> u32 {
        self.applet_attributes
    }

    /// Registers `applet` and returns its notification and parameter events.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::AlreadyRegistered`] when the applet registered
    /// before.
    pub fn initialize(
        &mut self,
        applet: AppletId,
        attributes: u32,
    ) -> Result<(u32, u32), AptError> {
        if self.slot(applet).is_some() {
            return Err(AptError::AlreadyRegistered { applet });
        }
        let notification_event = self.allocate_handle();
        let parameter_event = self.allocate_handle();
        self.applets.push(AppletSlot {
            applet,
            attributes,
            enabled: false,
            notification: SignalType::None.raw(),
            notification_event,
            parameter_event,
        });
        Ok((notification_event, parameter_event))
    }

    /// Enables the most recently registered applet with `attributes`.
    ///
    /// Enabling the application queues the wakeup parameter the home menu
    /// would otherwise send.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::AppletNotFound`] when no registered applet has
    /// those attributes.
    pub fn enable(&mut self, attributes: u32) -> Result<AppletId, AptError> {
        let slot = self
            .applets
            .iter_mut()
            .rev()
            .find(|slot| slot.attributes == attributes)
            .ok_or(AptError::AppletNotFound { attributes })?;
        slot.enabled = true;
        let applet = slot.applet;
        if applet == AppletId::APPLICATION && self.parameter.is_none() {
            self.parameter = Some(MessageParameter::signal(
                AppletId::HOME_MENU,
                applet,
                SignalType::Wakeup,
            ));
        }
        Ok(applet)
    }

    /// Registered slot of `applet`.
    #[must_use]
    pub fn slot(&self, applet: AppletId) -> Option<&AppletSlot> {
        self.applets.iter().find(|slot| slot.applet == applet)
    }

    /// Whether `applet` is registered. [`AppletId::ANY_LIBRARY_APPLET`]
    /// matches any registered library applet.
    #[must_use]
    pub fn is_registered(&self, applet: AppletId) -> bool {
        if applet == AppletId::ANY_LIBRARY_APPLET {
            return self
                .applets
                .iter()
                .any(|slot| slot.applet.is_library_applet());
        }
        self.slot(applet).is_some()
    }

    /// Takes the pending notification of `applet`.
    pub fn take_notification(&mut self, applet: AppletId) -> u32 {
        self.applets
            .iter_mut()
            .find(|slot| slot.applet == applet)
            .map_or(SignalType::None.raw(), |slot| {
                std::mem::replace(&mut slot.notification, SignalType::None.raw())
            })
    }

    /// Queues `notification` for `applet`. Returns `false` when the applet
    /// is not registered.
    pub fn notify(&mut self, applet: AppletId, notification: u32) -> bool {
        self.applets
            .iter_mut()
            .find(|slot| slot.applet == applet)
            .map(|slot| slot.notification = notification)
            .is_some()
    }

    /// Applet manager overview.
    #[must_use]
    pub fn manager_info(&self, position: u32) -> AppletManInfo {
        let active = self
            .applets
            .iter()
            .rev()
            .find(|slot| slot.enabled)
            .map_or(AppletId::NONE, |slot| slot.applet);
        let requested = self.library.map_or(active, |library| library.applet);
        AppletManInfo {
            position,
            requested,
            home_menu: AppletId::HOME_MENU,
            active,
        }
    }

    /// Parameter currently pending, if any.
    #[must_use]
    pub const fn pending_parameter(&self) -> Option<&MessageParameter> {
        self.parameter.as_ref()
    }

    /// Queues a parameter for its destination.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::ParameterPresent`] while an earlier parameter has
    /// not been received.
    pub fn send_parameter(&mut self, parameter: MessageParameter) -> Result<(), AptError> {
        if let Some(pending) = &self.parameter {
            return Err(AptError::ParameterPresent {
                sender: pending.sender,
                destination: pending.destination,
            });
        }
        self.parameter = Some(parameter);
        Ok(())
    }

    /// Returns the parameter pending for `applet` without consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::NoParameter`] when nothing is pending for it.
    pub fn glance_parameter(&self, applet: AppletId) -> Result<MessageParameter, AptError> {
        self.parameter
            .as_ref()
            .filter(|pending| pending.is_for(applet))
            .cloned()
            .ok_or(AptError::NoParameter { applet })
    }

    /// Consumes the parameter pending for `applet`.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::NoParameter`] when nothing is pending for it.
    pub fn receive_parameter(&mut self, applet: AppletId) -> Result<MessageParameter, AptError> {
        match self.parameter.take() {
            Some(pending) if pending.is_for(applet) => Ok(pending),
            other => {
                self.parameter = other;
                Err(AptError::NoParameter { applet })
            }
        }
    }

    /// Drops the pending parameter if it matches the given filters.
    pub fn cancel_parameter(
        &mut self,
        sender: Option<AppletId>,
        destination: Option<AppletId>,
    ) -> bool {
        let matches = self.parameter.as_ref().is_some_and(|pending| {
            sender.is_none_or(|id| pending.sender == id)
                && destination.is_none_or(|id| pending.destination == id)
        });
        if matches {
            self.parameter = None;
        }
        matches
    }

    /// Current library applet slot.
    #[must_use]
    pub const fn library_applet(&self) -> Option<LibraryApplet> {
        self.library
    }

    /// Claims the library slot for `applet`.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::LibraryAppletState`] while another library applet
    /// is running.
    pub fn prepare_library_applet(&mut self, applet: AppletId) -> Result<(), AptError> {
        self.claim_library_slot(applet, LibraryStage::Prepared, "prepare")
    }

    /// Starts preloading `applet` into the library slot.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::LibraryAppletState`] while another library applet
    /// is running.
    pub fn preload_library_applet(&mut self, applet: AppletId) -> Result<(), AptError> {
        self.claim_library_slot(applet, LibraryStage::Preloading, "preload")
    }

    /// Marks preloading of `applet` as finished.
    ///
    /// # Errors
    ///
    /// Returns an [`AptError`] when `applet` is not being preloaded.
    pub fn finish_preloading_library_applet(&mut self, applet: AppletId) -> Result<(), AptError> {
        let library = self.library_slot(applet)?;
        if library.stage != LibraryStage::Preloading {
            return Err(library_state("finish preloading", library.stage));
        }
        library.stage = LibraryStage::Loaded;
        Ok(())
    }

    /// Starts `applet` and hands it the wakeup parameter.
    ///
    /// Any parameter still pending is replaced: the application is blocked
    /// for as long as the library applet runs.
    ///
    /// # Errors
    ///
    /// Returns an [`AptError`] unless `applet` was prepared or preloaded.
    pub fn start_library_applet(
        &mut self,
        applet: AppletId,
        object: u32,
        buffer: Vec<u8>,
    ) -> Result<(), AptError> {
        let library = self.library_slot(applet)?;
        if !matches!(library.stage, LibraryStage::Prepared | LibraryStage::Loaded) {
            return Err(library_state("start", library.stage));
        }
        library.stage = LibraryStage::Started;
        self.parameter = Some(MessageParameter {
            sender: AppletId::APPLICATION,
            destination: applet,
            signal: SignalType::Wakeup.raw(),
            object,
            buffer,
        });
        Ok(())
    }

    /// Moves the running library applet to its closing stage.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::LibraryAppletState`] unless an applet is running.
    pub fn prepare_to_close_library_applet(&mut self) -> Result<(), AptError> {
        match &mut self.library {
            Some(library) if library.stage == LibraryStage::Started => {
                library.stage = LibraryStage::Closing;
                Ok(())
            }
            Some(library) => Err(library_state("prepare to close", library.stage)),
            None => Err(empty_library_slot("prepare to close")),
        }
    }

    /// Closes the library applet and wakes the application with its result.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::LibraryAppletState`] unless an applet is running
    /// or closing.
    pub fn close_library_applet(&mut self, object: u32, buffer: Vec<u8>) -> Result<(), AptError> {
        let library = self.library.ok_or_else(|| empty_library_slot("close"))?;
        if !matches!(library.stage, LibraryStage::Started | LibraryStage::Closing) {
            return Err(library_state("close", library.stage));
        }
        self.finish_library_applet(library.applet, SignalType::WakeupByExit, object, buffer);
        Ok(())
    }

    /// Cancels the library applet and wakes the application.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::LibraryAppletState`] when the slot is empty.
    pub fn cancel_library_applet(&mut self) -> Result<(), AptError> {
        let library = self.library.ok_or_else(|| empty_library_slot("cancel"))?;
        self.finish_library_applet(library.applet, SignalType::WakeupByCancel, 0, Vec::new());
        Ok(())
    }

    /// Records an application jump target.
    pub const fn prepare_application_jump(&mut self, flags: u32, program_id: u64, media_type: u8) {
        self.jump = Some(ApplicationJump {
            flags,
            program_id,
            media_type,
            performed: false,
        });
    }

    /// Performs the prepared jump, storing the arguments for the target.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::JumpNotPrepared`] without a prior preparation.
    pub fn do_application_jump(
        &mut self,
        mut param: Vec<u8>,
        mut hmac: Vec<u8>,
    ) -> Result<(), AptError> {
        let jump = self.jump.as_mut().ok_or(AptError::JumpNotPrepared)?;
        jump.performed = true;
        param.truncate(DELIVER_ARG_SIZE);
        hmac.truncate(DELIVER_HMAC_SIZE);
        self.deliver_arg = Some(DeliverArg {
            param,
            hmac,
            source_program_id: self.program_id,
        });
        Ok(())
    }

    /// Current program and jump target as `(current, media, next, media)`.
    #[must_use]
    pub fn program_ids_on_jump(&self) -> (u64, u8, u64, u8) {
        let (next, next_media) = self
            .jump
            .map_or((self.program_id, self.media_type), |jump| {
                (jump.program_id, jump.media_type)
            });
        (self.program_id, self.media_type, next, next_media)
    }

    /// Prepared jump, if any.
    #[must_use]
    pub const fn application_jump(&self) -> Option<ApplicationJump> {
        self.jump
    }

    /// Arguments delivered across the last jump, clipped to the requested
    /// sizes.
    #[must_use]
    pub fn deliver_arg(&self, param_size: usize, hmac_size: usize) -> Option<DeliverArg> {
        self.deliver_arg.as_ref().map(|arg| DeliverArg {
            param: clipped(&arg.param, param_size),
            hmac: clipped(&arg.hmac, hmac_size),
            source_program_id: arg.source_program_id,
        })
    }

    /// System menu argument, at most `size` bytes.
    #[must_use]
    pub fn load_sys_menu_arg(&self, size: usize) -> Vec<u8> {
        clipped(&self.sys_menu_arg, size)
    }

    /// Stores the system menu argument, keeping at most its fixed size.
    pub fn store_sys_menu_arg(&mut self, data: &[u8]) {
        let stored = clipped(data, SYS_MENU_ARG_SIZE);
        self.sys_menu_arg
            .iter_mut()
            .zip(stored.iter().chain(std::iter::repeat(&0)))
            .for_each(|(slot, byte)| *slot = *byte);
    }

    /// Stores the capture buffer descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::OutOfRange`] when `data` is larger than a
    /// descriptor.
    pub fn send_capture_buffer_info(&mut self, data: &[u8]) -> Result<(), AptError> {
        if data.len() > CAPTURE_BUFFER_INFO_SIZE {
            return Err(AptError::OutOfRange {
                name: "capture buffer size",
                value: u32::try_from(data.len()).unwrap_or(u32::MAX),
            });
        }
        self.capture_buffer = Some(data.to_vec());
        Ok(())
    }

    /// Takes the capture buffer descriptor.
    pub fn receive_capture_buffer_info(&mut self, size: usize) -> Vec<u8> {
        self.capture_buffer
            .take()
            .map(|info| clipped(&info, size))
            .unwrap_or_default()
    }

    /// Reads the capture buffer descriptor without consuming it.
    #[must_use]
    pub fn capture_info(&self, size: usize) -> Vec<u8> {
        self.capture_buffer
            .as_deref()
            .map(|info| clipped(info, size))
            .unwrap_or_default()
    }

    /// Wireless reboot descriptor, at most `size` bytes.
    #[must_use]
    pub fn wireless_reboot_info(&self, size: usize) -> Vec<u8> {
        clipped(&self.wireless_reboot_info, size)
    }

    /// Sets the share of CPU time reserved for the application.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::OutOfRange`] when `value` is not 1 or `percent`
    /// lies outside `5..=89`.
    pub fn set_cpu_time_limit(&mut self, value: u32, percent: u32) -> Result<(), AptError> {
        if value != 1 {
            return Err(AptError::OutOfRange { name: "value", value });
        }
        if !CPU_TIME_LIMIT_RANGE.contains(&percent) {
            return Err(AptError::OutOfRange {
                name: "percent",
                value: percent,
            });
        }
        self.cpu_time_limit = percent;
        Ok(())
    }

    /// Share of CPU time reserved for the application.
    ///
    /// # Errors
    ///
    /// Returns [`AptError::OutOfRange`] when `value` is not 1.
    pub const fn cpu_time_limit(&self, value: u32) -> Result<u32, AptError> {
        if value != 1 {
            return Err(AptError::OutOfRange { name: "value", value });
        }
        Ok(self.cpu_time_limit)
    }

    /// Sets the screenshot posting permission. Only the low nibble is kept.
    pub const fn set_screen_cap_post_permission(&mut self, permission: u32) {
        self.screen_cap_post_permission = permission & 0xF;
    }

    /// Screenshot posting permission.
    #[must_use]
    pub const fn screen_cap_post_permission(&self) -> u32 {
        self.screen_cap_post_permission
    }

    /// Whether the console is a New 3DS model.
    #[must_use]
    pub const fn is_new_3ds(&self) -> bool {
        self.new_3ds
    }

    const fn allocate_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn claim_library_slot(
        &mut self,
        applet: AppletId,
        stage: LibraryStage,
        operation: &'static str,
    ) -> Result<(), AptError> {
        if let Some(library) = self.library
            && matches!(library.stage, LibraryStage::Started | LibraryStage::Closing)
        {
            return Err(library_state(operation, library.stage));
        }
        self.library = Some(LibraryApplet { applet, stage });
        Ok(())
    }

    fn library_slot(&mut self, applet: AppletId) -> Result<&mut LibraryApplet, AptError> {
        self.library
            .as_mut()
            .filter(|library| library.applet == applet)
            .ok_or(AptError::LibraryAppletMismatch { requested: applet })
    }

    fn finish_library_applet(
        &mut self,
        applet: AppletId,
        signal: SignalType,
        object: u32,
        buffer: Vec<u8>,
    ) {
        self.library = None;
        self.parameter = Some(MessageParameter {
            sender: applet,
            destination: AppletId::APPLICATION,
            signal: signal.raw(),
            object,
            buffer,
        });
    }
}

const fn library_state(operation: &'static str, stage: LibraryStage) -> AptError {
    AptError::LibraryAppletState {
        operation,
        stage: stage.as_str(),
    }
}

const fn empty_library_slot(operation: &'static str) -> AptError {
    AptError::LibraryAppletState {
        operation,
        stage: "empty",
    }
}

fn clipped(data: &[u8], size: usize) -> Vec<u8> {
    data.get(..size).unwrap_or(data).to_vec()
}
