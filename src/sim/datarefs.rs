//! # Data Ref Catalogue
//!
//! Names of the X-Plane data refs sampled every cycle, and their resolution
//! to handles. Resolution happens once per session; a name the host does not
//! publish stays unresolved and reads as zero.

use super::{DataRef, SimAccessor};
use tracing::{debug, warn};

pub const PAUSED: &str = "sim/time/paused";
pub const ON_GROUND: &str = "sim/flightmodel/failures/onground_all";
pub const GEAR_RETRACTABLE: &str = "sim/aircraft/gear/acf_gear_retract";
pub const FLAP_RATIO: &str = "sim/cockpit2/controls/flap_system_deploy_ratio";
pub const GEAR_DEPLOY: &str = "sim/flightmodel2/gear/deploy_ratio";
pub const G_AXIAL: &str = "sim/flightmodel/forces/g_axil";
pub const G_NORMAL: &str = "sim/flightmodel/forces/g_nrml";
pub const G_SIDE: &str = "sim/flightmodel/forces/g_side";
pub const ACC_LOCAL_X: &str = "sim/flightmodel/position/local_ax";
pub const ACC_LOCAL_Y: &str = "sim/flightmodel/position/local_ay";
pub const ACC_LOCAL_Z: &str = "sim/flightmodel/position/local_az";
pub const VEL_ACF_X: &str = "sim/flightmodel/forces/vx_acf_axis";
pub const VEL_ACF_Y: &str = "sim/flightmodel/forces/vy_acf_axis";
pub const VEL_ACF_Z: &str = "sim/flightmodel/forces/vz_acf_axis";
pub const TRUE_AIRSPEED: &str = "sim/flightmodel/position/true_airspeed";
pub const AIR_DENSITY: &str = "sim/weather/rho";
pub const DYNAMIC_PRESSURE: &str = "sim/flightmodel/misc/Qstatic";
pub const PROP_THRUST: &str = "sim/flightmodel/engine/POINT_thrust";
pub const ALPHA: &str = "sim/flightmodel/position/alpha";
pub const STALL_WARN_ALPHA: &str = "sim/aircraft/overflow/acf_stall_warn_alpha";
pub const BETA: &str = "sim/flightmodel/position/beta";
pub const TIRE_DEFLECTION: &str = "sim/flightmodel2/gear/tire_vertical_deflection_mtr";
pub const ENGINE_TACRAD: &str = "sim/flightmodel/engine/ENGN_tacrad";
pub const ENGINE_N1: &str = "sim/flightmodel/engine/ENGN_N1_";
pub const PROP_TACRAD: &str = "sim/flightmodel/engine/POINT_tacrad";
pub const RUDDER_LEFT: &str = "sim/flightmodel/controls/ldruddef";
pub const RUDDER_RIGHT: &str = "sim/flightmodel/controls/rdruddef";
pub const VNE: &str = "sim/aircraft/view/acf_Vne";
pub const VSO: &str = "sim/aircraft/view/acf_Vso";
pub const VFE: &str = "sim/aircraft/view/acf_Vfe";
pub const VLE: &str = "sim/aircraft/overflow/acf_Vle";

/// Every data ref name the bridge resolves
pub const ALL: &[&str] = &[
    PAUSED, ON_GROUND, GEAR_RETRACTABLE, FLAP_RATIO, GEAR_DEPLOY,
    G_AXIAL, G_NORMAL, G_SIDE,
    ACC_LOCAL_X, ACC_LOCAL_Y, ACC_LOCAL_Z,
    VEL_ACF_X, VEL_ACF_Y, VEL_ACF_Z,
    TRUE_AIRSPEED, AIR_DENSITY, DYNAMIC_PRESSURE, PROP_THRUST,
    ALPHA, STALL_WARN_ALPHA, BETA, TIRE_DEFLECTION,
    ENGINE_TACRAD, ENGINE_N1, PROP_TACRAD,
    RUDDER_LEFT, RUDDER_RIGHT,
    VNE, VSO, VFE, VLE,
];

/// Resolved handles for every tracked data ref
#[derive(Debug, Clone, Default)]
pub struct DataRefs {
    pub paused: Option<DataRef>,
    pub on_ground: Option<DataRef>,
    pub gear_retractable: Option<DataRef>,
    pub flap_ratio: Option<DataRef>,
    pub gear_deploy: Option<DataRef>,
    pub g_axial: Option<DataRef>,
    pub g_normal: Option<DataRef>,
    pub g_side: Option<DataRef>,
    pub acc_local: [Option<DataRef>; 3],
    pub vel_acf: [Option<DataRef>; 3],
    pub true_airspeed: Option<DataRef>,
    pub air_density: Option<DataRef>,
    pub dynamic_pressure: Option<DataRef>,
    pub prop_thrust: Option<DataRef>,
    pub alpha: Option<DataRef>,
    pub stall_warn_alpha: Option<DataRef>,
    pub beta: Option<DataRef>,
    pub tire_deflection: Option<DataRef>,
    pub engine_tacrad: Option<DataRef>,
    pub engine_n1: Option<DataRef>,
    pub prop_tacrad: Option<DataRef>,
    pub rudder_left: Option<DataRef>,
    pub rudder_right: Option<DataRef>,
    pub vne: Option<DataRef>,
    pub vso: Option<DataRef>,
    pub vfe: Option<DataRef>,
    pub vle: Option<DataRef>,
}

impl DataRefs {
    /// Look up every catalogue name through the host
    ///
    /// Missing names are logged once here and read as zero afterwards.
    pub fn resolve<A: SimAccessor + ?Sized>(sim: &A) -> Self {
        let find = |name: &str| {
            let found = sim.find_data_ref(name);
            if found.is_none() {
                warn!("Data ref not found, reporting 0: {}", name);
            }
            found
        };

        let refs = Self {
            paused: find(PAUSED),
            on_ground: find(ON_GROUND),
            gear_retractable: find(GEAR_RETRACTABLE),
            flap_ratio: find(FLAP_RATIO),
            gear_deploy: find(GEAR_DEPLOY),
            g_axial: find(G_AXIAL),
            g_normal: find(G_NORMAL),
            g_side: find(G_SIDE),
            acc_local: [find(ACC_LOCAL_X), find(ACC_LOCAL_Y), find(ACC_LOCAL_Z)],
            vel_acf: [find(VEL_ACF_X), find(VEL_ACF_Y), find(VEL_ACF_Z)],
            true_airspeed: find(TRUE_AIRSPEED),
            air_density: find(AIR_DENSITY),
            dynamic_pressure: find(DYNAMIC_PRESSURE),
            prop_thrust: find(PROP_THRUST),
            alpha: find(ALPHA),
            stall_warn_alpha: find(STALL_WARN_ALPHA),
            beta: find(BETA),
            tire_deflection: find(TIRE_DEFLECTION),
            engine_tacrad: find(ENGINE_TACRAD),
            engine_n1: find(ENGINE_N1),
            prop_tacrad: find(PROP_TACRAD),
            rudder_left: find(RUDDER_LEFT),
            rudder_right: find(RUDDER_RIGHT),
            vne: find(VNE),
            vso: find(VSO),
            vfe: find(VFE),
            vle: find(VLE),
        };

        debug!("Resolved {}/{} data refs", refs.resolved_count(), ALL.len());
        refs
    }

    /// Number of handles that resolved
    pub fn resolved_count(&self) -> usize {
        let scalars = [
            self.paused, self.on_ground, self.gear_retractable, self.flap_ratio,
            self.gear_deploy, self.g_axial, self.g_normal, self.g_side,
            self.true_airspeed, self.air_density, self.dynamic_pressure, self.prop_thrust,
            self.alpha, self.stall_warn_alpha, self.beta, self.tire_deflection,
            self.engine_tacrad, self.engine_n1, self.prop_tacrad,
            self.rudder_left, self.rudder_right,
            self.vne, self.vso, self.vfe, self.vle,
        ];

        scalars
            .iter()
            .chain(self.acc_local.iter())
            .chain(self.vel_acf.iter())
            .filter(|r| r.is_some())
            .count()
    }
}
