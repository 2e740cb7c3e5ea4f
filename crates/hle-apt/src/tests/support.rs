//! Request builders and a wired-up service manager for APT tests.

use hle_ipc::{
    DispatchPolicy, Dispatcher, IpcRequest, IpcResponse, ServiceManager, Session, SharedModule,
};

use crate::{AppletId, AptServices, AptState, MAX_APT_SESSIONS};

pub(crate) const PROGRAM_ID: u64 = 0x0004_0000_0012_3400;

pub(crate) struct Apt {
    pub(crate) services: AptServices,
    pub(crate) manager: ServiceManager,
}

impl Apt {
    pub(crate) fn new() -> Self {
        Self::over(SharedModule::active(
            "apt",
            AptState::new(false).with_program(PROGRAM_ID, 1),
        ))
    }

    pub(crate) fn over(module: SharedModule<AptState>) -> Self {
        let dispatcher = Dispatcher::with_policy(DispatchPolicy::default());
        let services =
            AptServices::new(module, MAX_APT_SESSIONS, &dispatcher).expect("module is active");
        let manager = ServiceManager::new();
        services.register(&manager).expect("fresh manager");
        Self { services, manager }
    }

    pub(crate) fn connect(&self, name: &str) -> Session {
        self.manager.connect(name).expect("session available")
    }
}

pub(crate) fn call(session: &Session, request: &IpcRequest) -> IpcResponse {
    session.request(request).expect("session is open")
}

pub(crate) fn static_descriptor(size: usize, id: u32) -> u32 {
    let bytes = u32::try_from(size).expect("test buffers are small");
    (bytes << 14) | (id << 10) | 0x2
}

pub(crate) fn initialize(applet: AppletId, attributes: u32) -> IpcRequest {
    IpcRequest::new(vec![0x0002_0080, applet.0, attributes])
}

pub(crate) fn enable(attributes: u32) -> IpcRequest {
    IpcRequest::new(vec![0x0003_0040, attributes])
}

pub(crate) fn send_parameter(
    sender: AppletId,
    destination: AppletId,
    signal: u32,
    buffer: &[u8],
) -> IpcRequest {
    IpcRequest::with_buffers(
        vec![
            0x000C_0104,
            sender.0,
            destination.0,
            signal,
            u32::try_from(buffer.len()).expect("small buffer"),
            0,
            0x77,
            static_descriptor(buffer.len(), 0),
            0,
        ],
        vec![buffer.to_vec()],
    )
}

pub(crate) fn receive_parameter(applet: AppletId, size: u32) -> IpcRequest {
    IpcRequest::new(vec![0x000D_0080, applet.0, size])
}

pub(crate) fn glance_parameter(applet: AppletId, size: u32) -> IpcRequest {
    IpcRequest::new(vec![0x000E_0080, applet.0, size])
}
