use crate::renderer::Renderer;

#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) renderer: Renderer,
}
