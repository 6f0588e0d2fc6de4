//! 引擎内建名录。
//! 三张表都是进程级的不可变常量，初始化一次之后只读，
//! 可以安全地在并发的编译器实例之间共享：
//!   1. 内建变量（引擎注入的状态与常量）
//!   2. 内建函数（引擎提供的可调用项）
//!   3. 发射重写表（内建名 → 宿主命名空间 `H` 下的目标写法）
//! 解析器用 1+2 给标识符打 `is_intrinsic` 标记，
//! 静态分析用它们抑制“未声明”警告并检查调用参数个数，
//! 代码生成用 3 做名字重写。

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

/// 内建函数的参数个数规则。`max == None` 表示没有上限。
#[derive(Debug, Clone, Copy)]
pub struct ArityRule {
    pub min: usize,
    pub max: Option<usize>,
}

lazy_static! {
    /// 引擎注入的内建变量。`vk_*` 是虚拟键常量，
    /// 它们同时出现在重写表里，被发射为 `H.vk.*`。
    pub static ref INTRINSIC_VARIABLES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        for name in [
            "position", "velocity", "size", "color", "rotation", "scale",
            "visible", "active", "tag", "components",
            "GRAVITY", "FRICTION", "MAX_FALL_SPEED",
            "delta_time", "current_time", "game_time",
            "vk_left", "vk_right", "vk_up", "vk_down",
            "vk_space", "vk_enter", "vk_escape", "vk_shift",
        ] {
            s.insert(name);
        }
        s
    };

    /// 引擎提供的内建函数。
    pub static ref INTRINSIC_FUNCTIONS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        for name in [
            "create", "step", "draw", "on_collision",
            "keyboard_check", "keyboard_check_pressed", "keyboard_check_released",
            "mouse_check", "mouse_check_pressed", "mouse_check_released",
            "draw_sprite", "draw_text", "draw_rectangle", "draw_circle", "draw_line",
            "play_sound", "play_music", "stop_sound", "stop_music",
            "vec2", "vec3",
            "point_distance", "check_collision",
            "create_object", "destroy_object", "find_object", "find_nearest",
        ] {
            s.insert(name);
        }
        s
    };

    /// 静态分析使用的参数个数规则。
    pub static ref ARITY_RULES: HashMap<&'static str, ArityRule> = {
        let mut m = HashMap::new();
        // 键盘查询只接受一个键码
        m.insert("keyboard_check", ArityRule { min: 1, max: Some(1) });
        m.insert("keyboard_check_pressed", ArityRule { min: 1, max: Some(1) });
        m.insert("keyboard_check_released", ArityRule { min: 1, max: Some(1) });
        // 绘制至少需要主体加一组坐标
        m.insert("draw_sprite", ArityRule { min: 3, max: None });
        m.insert("draw_text", ArityRule { min: 3, max: None });
        m
    };

    /// 发射重写表。只有宿主接口明确列出的名字会被重写，
    /// 其余内建名（`mouse_check*`、`stop_sound`、`game_time` 等）原样透传；
    /// 扩表属于接口变更，不在发射器里推断。
    pub static ref REWRITE_TABLE: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("keyboard_check", "H.keyboardCheck");
        m.insert("keyboard_check_pressed", "H.keyboardCheckPressed");
        m.insert("keyboard_check_released", "H.keyboardCheckReleased");
        m.insert("draw_sprite", "H.drawSprite");
        m.insert("draw_text", "H.drawText");
        m.insert("draw_rectangle", "H.drawRectangle");
        m.insert("draw_circle", "H.drawCircle");
        m.insert("draw_line", "H.drawLine");
        m.insert("play_sound", "H.playSound");
        m.insert("play_music", "H.playMusic");
        m.insert("check_collision", "H.checkCollision");
        m.insert("point_distance", "H.pointDistance");
        m.insert("delta_time", "H.deltaTime");
        m.insert("current_time", "H.currentTime");
        m.insert("vk_left", "H.vk.left");
        m.insert("vk_right", "H.vk.right");
        m.insert("vk_up", "H.vk.up");
        m.insert("vk_down", "H.vk.down");
        m.insert("vk_space", "H.vk.space");
        m.insert("vk_enter", "H.vk.enter");
        m.insert("vk_escape", "H.vk.escape");
        m.insert("vk_shift", "H.vk.shift");
        m
    };
}

/// 一个名字是否属于任一内建名录。
pub fn is_intrinsic(name: &str) -> bool {
    INTRINSIC_VARIABLES.contains(name) || INTRINSIC_FUNCTIONS.contains(name)
}

/// 生命周期函数对应的注册入口。脚本里每声明一个顶层生命周期函数，
/// 发射器就在尾声里生成一次对应的 `H.register*` 调用。
pub fn lifecycle_registration(name: &str) -> Option<&'static str> {
    match name {
        "create" => Some("registerCreate"),
        "step" => Some("registerStep"),
        "draw" => Some("registerDraw"),
        "on_collision" => Some("registerCollision"),
        _ => None,
    }
}
