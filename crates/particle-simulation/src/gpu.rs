//! wgpu compute backend
//!
//! Particles live in one device buffer per attribute, mirrored on the host by a
//! [`ParticleColumns`] store. New particles are uploaded lazily at the start of
//! the next step. A frame encodes every substep into a single submission:
//!
//! 1. integrate (skipped for a zero substep time)
//! 2. clear the cell counters and bin particles into fixed-capacity cells
//! 3. relax contacts in nine dispatches, one per 3×3 cell color
//!
//! With readback enabled the host mirror is refreshed after each frame, which
//! blocks until the device is idle.

use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use particle_physics::{
    Error as PhysicsError, Particle, ParticleColumns, ParticleStore, SpatialGrid, WorldBounds,
};
use wgpu::util::DeviceExt;

use crate::backend::{SimulationBackend, StepReport, SubstepReport};
use crate::error::{Error, Result};
use crate::params::{GpuParams, SimulationConfig};

const INTEGRATE_WORKGROUP: u32 = 256;
const GRID_WORKGROUP: u32 = 256;
const COLLIDE_WORKGROUP: u32 = 64;
const MAX_WORKGROUPS: u32 = 65_535;

/// Nine colors: cells whose coordinates agree modulo 3 share one
const CELL_COLORS: u32 = 9;

const VEC2_SIZE: u64 = std::mem::size_of::<[f32; 2]>() as u64;
const SCALAR_SIZE: u64 = std::mem::size_of::<f32>() as u64;

/// Per-dispatch selector of the collide pass (matches `CellColor` in WGSL)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct CellColor {
    offset: [u32; 2],
    _padding: [u32; 2],
}

fn workgroups(items: u32, size: u32) -> u32 {
    items.div_ceil(size)
}

/// Storage buffers bound by the particle bind group (bindings 1 to 6)
const STORAGE_BINDINGS: u32 = 6;

/// Byte sizes of the device allocations for one configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BufferSizes {
    vec2: u64,
    scalar: u64,
    cell_counts: u64,
    cell_entries: u64,
    staging: u64,
}

impl BufferSizes {
    fn new(capacity: usize, cells: u64, cell_capacity: u32) -> Self {
        let vec2 = capacity as u64 * VEC2_SIZE;
        Self {
            vec2,
            scalar: capacity as u64 * SCALAR_SIZE,
            cell_counts: cells * SCALAR_SIZE,
            cell_entries: cells * cell_capacity as u64 * SCALAR_SIZE,
            // Positions followed by previous positions.
            staging: 2 * vec2,
        }
    }

    /// Errors:
    /// - `InvalidConfig` if a buffer or the binding count exceeds `limits`.
    fn check(&self, limits: &wgpu::Limits) -> Result<()> {
        if limits.max_storage_buffers_per_shader_stage < STORAGE_BINDINGS {
            return Err(PhysicsError::InvalidConfig(format!(
                "device binds {} storage buffers per stage, {STORAGE_BINDINGS} needed",
                limits.max_storage_buffers_per_shader_stage
            ))
            .into());
        }

        let binding_limit = limits.max_storage_buffer_binding_size as u64;
        let storage = [
            ("particle attribute", self.vec2),
            ("cell count", self.cell_counts),
            ("cell entry", self.cell_entries),
        ];
        for (label, size) in storage {
            if size > binding_limit || size > limits.max_buffer_size {
                return Err(PhysicsError::InvalidConfig(format!(
                    "{label} buffer of {size} bytes exceeds the device limit of {} bytes",
                    binding_limit.min(limits.max_buffer_size)
                ))
                .into());
            }
        }
        if self.staging > limits.max_buffer_size {
            return Err(PhysicsError::InvalidConfig(format!(
                "readback buffer of {} bytes exceeds the device limit of {} bytes",
                self.staging, limits.max_buffer_size
            ))
            .into());
        }
        Ok(())
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(
    binding: u32,
    has_dynamic_offset: bool,
    min_binding_size: Option<wgpu::BufferSize>,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset,
            min_binding_size,
        },
        count: None,
    }
}

/// GPU-resident particle simulation
pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    // Particle attributes
    position_buffer: wgpu::Buffer,
    previous_buffer: wgpu::Buffer,
    acceleration_buffer: wgpu::Buffer,
    radius_buffer: wgpu::Buffer,

    // Grid
    cell_count_buffer: wgpu::Buffer,
    _cell_entry_buffer: wgpu::Buffer,

    params_buffer: wgpu::Buffer,
    _color_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,

    integrate_pipeline: wgpu::ComputePipeline,
    grid_pipeline: wgpu::ComputePipeline,
    collide_pipeline: wgpu::ComputePipeline,

    particle_bind_group: wgpu::BindGroup,
    color_bind_group: wgpu::BindGroup,
    color_stride: u32,

    params: GpuParams,
    world: WorldBounds,
    colored_cells: u32,
    capacity: usize,

    host: ParticleColumns,
    /// Host particles `..uploaded` are already on the device
    uploaded: usize,
    readback: bool,
}

impl GpuBackend {
    /// Open the default high-performance adapter and build the backend,
    /// blocking on device creation.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        pollster::block_on(Self::new_async(config))
    }

    pub async fn new_async(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Simulation Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Self::from_device(device, queue, config)
    }

    /// Build on an existing device, e.g. one shared with a renderer.
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: &SimulationConfig,
    ) -> Result<Self> {
        config.validate()?;
        let world = config.world()?;

        // Same cell topology as the host grid.
        let layout = SpatialGrid::new(world.width(), world.height())?;
        let columns = layout.columns() as u32;
        let rows = layout.rows() as u32;
        let cells = columns as u64 * rows as u64;
        let cell_capacity = config.gpu_cell_capacity;
        let colored_cells = columns.div_ceil(3) * rows.div_ceil(3);
        let capacity = config.max_particles;

        if workgroups(capacity as u32, INTEGRATE_WORKGROUP) > MAX_WORKGROUPS {
            return Err(PhysicsError::InvalidConfig(format!(
                "max_particles {capacity} exceeds a single dispatch"
            ))
            .into());
        }
        if workgroups(colored_cells, COLLIDE_WORKGROUP) > MAX_WORKGROUPS {
            return Err(PhysicsError::InvalidConfig(format!(
                "{columns}x{rows} grid exceeds a single dispatch"
            ))
            .into());
        }

        let sizes = BufferSizes::new(capacity, cells, cell_capacity);
        sizes.check(&device.limits())?;

        log::info!("Initializing GpuBackend...");

        let attribute_buffer = |label: &str, size: u64, usage: wgpu::BufferUsages| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            })
        };

        let position_buffer = attribute_buffer(
            "Position Buffer",
            sizes.vec2,
            wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
        );
        let previous_buffer = attribute_buffer(
            "Previous Position Buffer",
            sizes.vec2,
            wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
        );
        let acceleration_buffer = attribute_buffer(
            "Acceleration Buffer",
            sizes.vec2,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        );
        let radius_buffer = attribute_buffer(
            "Radius Buffer",
            sizes.scalar,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        );
        let cell_count_buffer = attribute_buffer(
            "Cell Count Buffer",
            sizes.cell_counts,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        );
        let cell_entry_buffer = attribute_buffer(
            "Cell Entry Buffer",
            sizes.cell_entries,
            wgpu::BufferUsages::STORAGE,
        );
        let staging_buffer = attribute_buffer(
            "Readback Staging Buffer",
            sizes.staging,
            wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        );

        let params = GpuParams::new(&world, config.damping, columns, rows, cell_capacity);
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Simulation Params Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // One color selector per dynamic-offset slot.
        let color_size = std::mem::size_of::<CellColor>() as u32;
        let color_stride =
            color_size.next_multiple_of(device.limits().min_uniform_buffer_offset_alignment);
        let mut color_bytes = vec![0u8; (color_stride * CELL_COLORS) as usize];
        for k in 0..CELL_COLORS {
            let color = CellColor {
                offset: [k / 3, k % 3],
                _padding: [0; 2],
            };
            let start = (k * color_stride) as usize;
            color_bytes[start..start + color_size as usize]
                .copy_from_slice(bytemuck::bytes_of(&color));
        }
        let color_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cell Color Buffer"),
            contents: &color_bytes,
            usage: wgpu::BufferUsages::UNIFORM,
        });

        log::info!("Buffers created");

        let integrate_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Integration Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/integrate.wgsl").into()),
        });
        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Grid Build Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/grid.wgsl").into()),
        });
        let collide_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Collision Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/collide.wgsl").into()),
        });

        log::info!("Shaders loaded");

        let particle_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Particle Bind Group Layout"),
                entries: &[
                    uniform_entry(0, false, None),
                    storage_entry(1, false),
                    storage_entry(2, false),
                    storage_entry(3, true),
                    storage_entry(4, true),
                    storage_entry(5, false),
                    storage_entry(6, false),
                ],
            });

        let color_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Cell Color Bind Group Layout"),
                entries: &[uniform_entry(0, true, wgpu::BufferSize::new(color_size as u64))],
            });

        let particle_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Particle Pipeline Layout"),
                bind_group_layouts: &[&particle_bind_group_layout],
                push_constant_ranges: &[],
            });
        let collide_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Collision Pipeline Layout"),
                bind_group_layouts: &[&particle_bind_group_layout, &color_bind_group_layout],
                push_constant_ranges: &[],
            });

        let integrate_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Integration Pipeline"),
            layout: Some(&particle_pipeline_layout),
            module: &integrate_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });
        let grid_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Grid Build Pipeline"),
            layout: Some(&particle_pipeline_layout),
            module: &grid_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });
        let collide_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Collision Pipeline"),
            layout: Some(&collide_pipeline_layout),
            module: &collide_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        log::info!("Pipelines created");

        let particle_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Bind Group"),
            layout: &particle_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: position_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: previous_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: acceleration_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: radius_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: cell_count_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: cell_entry_buffer.as_entire_binding(),
                },
            ],
        });

        let color_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cell Color Bind Group"),
            layout: &color_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &color_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(color_size as u64),
                }),
            }],
        });

        log::info!(
            "✓ GPU backend: {columns}x{rows} cells x {cell_capacity} slots, {capacity} particles max"
        );

        Ok(Self {
            device,
            queue,
            position_buffer,
            previous_buffer,
            acceleration_buffer,
            radius_buffer,
            cell_count_buffer,
            _cell_entry_buffer: cell_entry_buffer,
            params_buffer,
            _color_buffer: color_buffer,
            staging_buffer,
            integrate_pipeline,
            grid_pipeline,
            collide_pipeline,
            particle_bind_group,
            color_bind_group,
            color_stride,
            params,
            world,
            colored_cells,
            capacity,
            host: ParticleColumns::with_capacity(capacity.min(1 << 16)),
            uploaded: 0,
            readback: config.gpu_readback,
        })
    }

    /// Device positions, `vec2<f32>` per particle, for zero-copy rendering.
    pub fn position_buffer(&self) -> &wgpu::Buffer {
        &self.position_buffer
    }

    pub fn previous_position_buffer(&self) -> &wgpu::Buffer {
        &self.previous_buffer
    }

    pub fn radius_buffer(&self) -> &wgpu::Buffer {
        &self.radius_buffer
    }

    /// Host mirror; kinematics are as fresh as the last readback.
    pub fn host_columns(&self) -> &ParticleColumns {
        &self.host
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn set_readback(&mut self, readback: bool) {
        self.readback = readback;
    }

    /// Copy device kinematics into the host mirror now.
    pub fn synchronize(&mut self) -> Result<()> {
        self.upload();
        let count = self.uploaded as u64;
        if count == 0 {
            return Ok(());
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        self.encode_readback(&mut encoder, count);
        self.queue.submit(std::iter::once(encoder.finish()));
        self.read_back(count)
    }

    /// Write host particles the device has not seen yet.
    fn upload(&mut self) {
        let len = self.host.len();
        if self.uploaded == len {
            return;
        }
        let fresh = self.uploaded..len;
        let vec2_offset = self.uploaded as u64 * VEC2_SIZE;

        self.queue.write_buffer(
            &self.position_buffer,
            vec2_offset,
            bytemuck::cast_slice(&self.host.positions()[fresh.clone()]),
        );
        self.queue.write_buffer(
            &self.previous_buffer,
            vec2_offset,
            bytemuck::cast_slice(&self.host.previous_positions()[fresh.clone()]),
        );
        self.queue.write_buffer(
            &self.acceleration_buffer,
            vec2_offset,
            bytemuck::cast_slice(&self.host.accelerations()[fresh.clone()]),
        );
        self.queue.write_buffer(
            &self.radius_buffer,
            self.uploaded as u64 * SCALAR_SIZE,
            bytemuck::cast_slice(&self.host.radii()[fresh.clone()]),
        );

        log::debug!("Uploaded {} new particles", fresh.len());
        self.uploaded = len;
    }

    fn encode_substep(&self, encoder: &mut wgpu::CommandEncoder, integrate: bool, count: u32) {
        let particle_groups = workgroups(count, INTEGRATE_WORKGROUP);

        // Step 1: Integrate motion
        if integrate {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Integration Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.integrate_pipeline);
            compute_pass.set_bind_group(0, &self.particle_bind_group, &[]);
            compute_pass.dispatch_workgroups(particle_groups, 1, 1);
        }

        // Step 2: Rebuild the grid
        {
            encoder.clear_buffer(&self.cell_count_buffer, 0, None);

            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Grid Build Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.grid_pipeline);
            compute_pass.set_bind_group(0, &self.particle_bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroups(count, GRID_WORKGROUP), 1, 1);
        }

        // Step 3: Relax contacts, one dispatch per cell color
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Collision Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.collide_pipeline);
            compute_pass.set_bind_group(0, &self.particle_bind_group, &[]);
            let cell_groups = workgroups(self.colored_cells, COLLIDE_WORKGROUP);
            for color in 0..CELL_COLORS {
                let offset = color * self.color_stride;
                compute_pass.set_bind_group(1, &self.color_bind_group, &[offset]);
                compute_pass.dispatch_workgroups(cell_groups, 1, 1);
            }
        }
    }

    fn encode_readback(&self, encoder: &mut wgpu::CommandEncoder, count: u64) {
        let bytes = count * VEC2_SIZE;
        encoder.copy_buffer_to_buffer(&self.position_buffer, 0, &self.staging_buffer, 0, bytes);
        encoder.copy_buffer_to_buffer(&self.previous_buffer, 0, &self.staging_buffer, bytes, bytes);
    }

    /// Map the staging buffer and copy `count` particles into the host mirror.
    fn read_back(&mut self, count: u64) -> Result<()> {
        let bytes = count * VEC2_SIZE;
        let slice = self.staging_buffer.slice(..2 * bytes);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;
        rx.recv()
            .map_err(|e| Error::Readback(e.to_string()))?
            .map_err(|e| Error::Readback(e.to_string()))?;

        {
            let data = slice.get_mapped_range();
            let (positions, previous) = data.split_at(bytes as usize);
            self.host.overwrite_kinematics(
                bytemuck::cast_slice(positions),
                bytemuck::cast_slice(previous),
            );
        }
        self.staging_buffer.unmap();
        Ok(())
    }
}

impl SimulationBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn world(&self) -> &WorldBounds {
        &self.world
    }

    fn particle_count(&self) -> usize {
        self.host.len()
    }

    fn particle(&self, index: usize) -> Option<Particle> {
        self.host.get(index)
    }

    fn push(&mut self, particle: Particle) -> Result<usize> {
        if self.host.len() >= self.capacity {
            return Err(PhysicsError::CapacityExceeded {
                capacity: self.capacity,
            }
            .into());
        }
        Ok(self.host.push(particle))
    }

    fn substep(&mut self, dt: f32) -> Result<SubstepReport> {
        self.step(dt, 1)?;
        Ok(SubstepReport::default())
    }

    fn step(&mut self, sub_dt: f32, substeps: u32) -> Result<StepReport> {
        let start = Instant::now();
        self.upload();

        let count = self.host.len() as u32;
        if count > 0 && substeps > 0 {
            self.queue.write_buffer(
                &self.params_buffer,
                0,
                bytemuck::bytes_of(&self.params.for_step(sub_dt, count)),
            );

            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Simulation Encoder"),
                });
            for _ in 0..substeps {
                self.encode_substep(&mut encoder, sub_dt > 0.0, count);
            }
            if self.readback {
                self.encode_readback(&mut encoder, count as u64);
            }
            self.queue.submit(std::iter::once(encoder.finish()));

            if self.readback {
                self.read_back(count as u64)?;
            }
        }

        Ok(StepReport {
            substeps,
            elapsed: start.elapsed(),
            ..StepReport::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sizes_fit_default_limits() -> Result<()> {
        let config = SimulationConfig::default();
        let sizes = BufferSizes::new(config.max_particles, 200 * 200, config.gpu_cell_capacity);
        assert_eq!(sizes.cell_entries, 200 * 200 * 16 * 4);
        sizes.check(&wgpu::Limits::default())
    }

    #[test]
    fn oversized_cell_buffers_are_rejected() {
        let limits = wgpu::Limits::default();
        // 200x200 cells with 1000 slots: 160 MB
        let deep = BufferSizes::new(1000, 200 * 200, 1000);
        // 2000x2000 cells with 16 slots: 256 MB
        let wide = BufferSizes::new(1000, 2000 * 2000, 16);
        for sizes in [deep, wide] {
            assert!(matches!(
                sizes.check(&limits),
                Err(Error::Physics(PhysicsError::InvalidConfig(_)))
            ));
        }
    }

    #[test]
    fn too_few_storage_bindings_are_rejected() {
        let limits = wgpu::Limits {
            max_storage_buffers_per_shader_stage: 4,
            ..wgpu::Limits::default()
        };
        let sizes = BufferSizes::new(1000, 100, 16);
        assert!(sizes.check(&limits).is_err());
    }
}
