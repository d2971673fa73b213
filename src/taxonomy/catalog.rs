//! The shipped overseas-investment compliance framework: 8 categories,
//! 35 requirements. Identifiers are contractual; do not renumber.

pub(super) type RequirementRow = (u32, &'static str, &'static str, &'static str);

pub(super) const BUILTIN_CATALOG: &[(&str, &[RequirementRow])] = &[
    (
        "一、治理与战略",
        &[
            (
                1,
                "海外业务治理与决策管理办法",
                "境外投资主体及其海外子公司的治理架构与重大事项决策",
                "决策权限划分、重大投资审批流程、集体决策与记录留痕",
            ),
            (
                2,
                "董事会海外风险监督细则",
                "董事会及其专门委员会对海外业务风险的监督",
                "董事会职责、风险报告频次、专门委员会设置、问责机制",
            ),
            (
                3,
                "海外子公司管理授权与责任制度",
                "母公司对海外子公司的授权管理与责任落实",
                "授权清单、权责对等、授权调整与回收、责任追究",
            ),
            (
                4,
                "战略规划与投资决策流程规范",
                "海外业务战略规划编制及投资项目的立项、论证与决策",
                "可行性研究、投资论证、负面清单、投后评价",
            ),
        ],
    ),
    (
        "二、全面风险管理",
        &[
            (
                5,
                "海外全面风险管理基本制度",
                "覆盖海外业务全流程的风险管理体系",
                "三道防线、风险管理组织、制度体系、职责分工",
            ),
            (
                6,
                "风险偏好与容忍度政策",
                "企业对海外业务风险的偏好设定与容忍边界",
                "风险偏好陈述、容忍度指标、限额管理、超限处置",
            ),
            (
                7,
                "风险识别评估与分级管理办法",
                "海外风险的识别、评估方法与分级分类管理",
                "风险清单、评估方法、风险等级划分、国别风险评估",
            ),
            (
                8,
                "风险监测预警与报告制度",
                "海外风险指标监测、预警触发与信息报送",
                "关键风险指标、预警阈值、报告路径与时限、重大事项报告",
            ),
            (
                9,
                "风险应对与缓释措施管理办法",
                "针对已识别风险的应对策略与缓释安排",
                "规避、降低、转移、承受策略，应对预案，缓释措施落实",
            ),
            (
                10,
                "风险事件管理与调查制度",
                "海外风险事件的处置、调查与整改",
                "事件分级、应急处置、原因调查、整改与问责",
            ),
            (
                11,
                "风险管理成熟度与绩效评估制度",
                "风险管理体系运行效果的评价与考核",
                "成熟度模型、评估频次、考核指标、持续改进",
            ),
        ],
    ),
    (
        "三、合规与法律",
        &[
            (
                12,
                "全球合规管理体系文件（ISO 37301 对标）",
                "覆盖境内外经营的合规管理体系建设",
                "合规组织、合规义务识别、合规审查、合规培训与评价",
            ),
            (
                13,
                "反腐败与反贿赂政策",
                "境外经营中的反腐败、反商业贿赂要求",
                "禁止行为、礼品招待、第三方付款、举报与调查",
            ),
            (
                14,
                "贸易制裁与出口管制合规指引",
                "涉及制裁名单、出口管制物项与技术的业务",
                "名单筛查、物项分类、许可证管理、制裁风险评估",
            ),
            (
                15,
                "数据保护与隐私合规制度",
                "个人信息与重要数据的处理及跨境传输",
                "数据分类、跨境传输评估、个人信息保护、数据安全事件",
            ),
            (
                16,
                "竞争法与反垄断合规指引",
                "境外并购及经营中的反垄断与公平竞争要求",
                "经营者集中申报、垄断协议、滥用市场支配地位",
            ),
            (
                17,
                "第三方尽职调查和诚信审查程序",
                "合作伙伴、代理商、供应商等第三方的准入与审查",
                "尽职调查范围、诚信记录、受益所有人识别、持续监控",
            ),
        ],
    ),
    (
        "四、财务与市场风险",
        &[
            (
                18,
                "外汇风险管理政策",
                "境外投资与经营中的汇率与外汇管制风险",
                "汇率敞口、套期保值、外汇登记与资金汇出入",
            ),
            (
                19,
                "商品价格对冲管理办法",
                "大宗商品价格波动风险的对冲管理",
                "套期保值策略、衍生品交易授权、头寸限额",
            ),
            (
                20,
                "信用风险管理制度",
                "境外交易对手及客户的信用风险",
                "信用评级、授信额度、应收账款管理、担保管理",
            ),
            (
                21,
                "资金集中与流动性管理办法",
                "境外资金的集中管理与流动性保障",
                "资金池、账户管理、流动性储备、融资与担保审批",
            ),
        ],
    ),
    (
        "五、运营与 HSE",
        &[
            (
                22,
                "海外 HSE 管理体系标准",
                "海外项目的健康、安全与环境管理体系",
                "HSE 组织、管理体系认证、作业许可、绩效考核",
            ),
            (
                23,
                "环境与气候变化管理办法（ESG）",
                "境外项目的环境保护、气候变化应对与 ESG 披露",
                "环境影响评价、排放管理、生态保护、ESG 信息披露",
            ),
            (
                24,
                "生产安全事故预防与应急制度",
                "海外生产经营中的安全事故预防与应急响应",
                "隐患排查、应急预案、应急演练、事故报告",
            ),
            (
                25,
                "供应链风险与可持续采购政策",
                "境外供应链稳定性与采购合规",
                "供应商评估、可持续采购标准、供应中断应对",
            ),
            (
                26,
                "设备资产完整性管理制度",
                "海外重要设备与资产的全生命周期管理",
                "资产台账、检验维护、完整性评估、报废处置",
            ),
        ],
    ),
    (
        "六、安全与危机",
        &[
            (
                27,
                "海外安全防护与人员安保管理办法",
                "境外机构、项目及人员的安全防护",
                "安全风险评估、安保措施、出行管理、安全培训",
            ),
            (
                28,
                "危机管理与业务连续性计划(BCP)制度",
                "海外突发危机的应对与关键业务持续运营",
                "危机分级、指挥体系、业务连续性计划、恢复演练",
            ),
            (
                29,
                "政治风险保险与风险转移指引",
                "东道国政治风险的保险安排与风险转移",
                "海外投资保险、征收与战争险、风险分担安排",
            ),
        ],
    ),
    (
        "七、信息与网络安全",
        &[
            (
                30,
                "网络安全与信息系统管理制度",
                "海外机构信息系统与网络的安全管理",
                "等级保护、访问控制、安全监测、网络安全事件响应",
            ),
            (
                31,
                "工控系统安全规范",
                "海外生产设施工业控制系统的安全防护",
                "工控网络隔离、补丁管理、远程运维管控",
            ),
            (
                32,
                "信息分类分级与保密管理办法",
                "涉密与敏感信息的分类分级及保密管理",
                "信息定密、分级标识、保密审查、泄密处置",
            ),
        ],
    ),
    (
        "八、社会责任与人力",
        &[
            (
                33,
                "社区关系与社会责任(CSR)政策",
                "境外项目与当地社区的关系维护及社会责任履行",
                "社区沟通、利益相关方管理、公益投入、属地化经营",
            ),
            (
                34,
                "人权与劳工标准政策",
                "境外用工中的人权保障与劳工标准",
                "禁止强迫劳动与童工、劳动合同、工时与薪酬、申诉机制",
            ),
            (
                35,
                "海外员工健康与福利管理制度",
                "外派及当地员工的健康保障与福利待遇",
                "健康体检、医疗保障、心理援助、休假与福利",
            ),
        ],
    ),
];
