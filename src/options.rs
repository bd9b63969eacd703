/// Render toggles read by the renderer at the start of every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    pub backface_culling: bool,
    pub depth_test: bool,
    pub wireframe: bool,
    /// Draw a small unlit sphere at every active light.
    pub show_lights: bool,
    /// Shade surfaces with their normals instead of the lighting model.
    pub show_normals: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            backface_culling: true,
            depth_test: true,
            wireframe: false,
            show_lights: true,
            show_normals: false,
        }
    }
}

/// Names one toggle of [`RenderOptions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderOption {
    BackfaceCulling,
    DepthTest,
    Wireframe,
    ShowLights,
    ShowNormals,
}

impl RenderOptions {
    pub fn get(&self, option: RenderOption) -> bool {
        match option {
            RenderOption::BackfaceCulling => self.backface_culling,
            RenderOption::DepthTest => self.depth_test,
            RenderOption::Wireframe => self.wireframe,
            RenderOption::ShowLights => self.show_lights,
            RenderOption::ShowNormals => self.show_normals,
        }
    }

    pub fn set(&mut self, option: RenderOption, value: bool) {
        let slot = match option {
            RenderOption::BackfaceCulling => &mut self.backface_culling,
            RenderOption::DepthTest => &mut self.depth_test,
            RenderOption::Wireframe => &mut self.wireframe,
            RenderOption::ShowLights => &mut self.show_lights,
            RenderOption::ShowNormals => &mut self.show_normals,
        };
        *slot = value;
    }

    /// Flips `option`, returning its new value.
    pub fn toggle(&mut self, option: RenderOption) -> bool {
        let value = !self.get(option);
        self.set(option, value);
        value
    }

    /// Fixed-function state the rasterizer applies for this frame.
    pub fn pipeline_state(&self) -> PipelineState {
        PipelineState {
            cull_back_faces: self.backface_culling,
            depth_test: self.depth_test,
        }
    }

    /// How meshes are rasterized for this frame.
    pub fn primitive_mode(&self) -> PrimitiveMode {
        if self.wireframe {
            PrimitiveMode::Wireframe
        } else {
            PrimitiveMode::Filled
        }
    }
}

/// Cull and depth state; part of a pipeline's identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineState {
    pub cull_back_faces: bool,
    pub depth_test: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        RenderOptions::default().pipeline_state()
    }
}

/// Whether a mesh is drawn as triangles or as its edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    #[default]
    Filled,
    Wireframe,
}
