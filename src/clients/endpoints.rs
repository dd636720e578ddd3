//! 起点接口地址

/// 用户资料（登录检测）
pub const PROFILE: &str = "https://druidv6.if.qidian.com/argus/api/v1/user/getprofile";
/// 签到
pub const CHECKIN: &str = "https://druidv6.if.qidian.com/argus/api/v2/checkin/checkin";
/// 福利中心任务列表
pub const BENEFIT_PAGE: &str = "https://h5.if.qidian.com/argus/api/v2/video/adv/mainPage";
/// 完成激励任务 / 领取奖励
pub const FINISH_WATCH: &str = "https://h5.if.qidian.com/argus/api/v1/video/adv/finishWatch";
/// 抽奖详情
pub const CHECKIN_DETAIL: &str = "https://h5.if.qidian.com/argus/api/v2/checkin/detail";
/// 抽奖视频回调
pub const VIDEO_CALLBACK: &str = "https://h5.if.qidian.com/argus/api/v2/video/callback";
/// 抽奖
pub const LOTTERY: &str = "https://h5.if.qidian.com/argus/api/v2/checkin/lottery";

/// 游戏页面
pub const GAME_PAGE: &str = "https://qdgame.qidian.com/game";
/// 游戏曝光统计（获取 PHESSID）
pub const GAME_TRACK: &str = "https://lygame.qidian.com/home/statistic/track";
/// 游戏心跳
pub const GAME_HEARTBEAT: &str = "https://lygame.qidian.com/home/log/heartbeat";
